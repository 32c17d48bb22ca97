//! Validated command dispatch.
//!
//! `handle` works in two halves. The first half only reads: it finds the
//! pending decision, checks the command answers it, and checks the sender
//! owns it. Any failure there returns a `CommandError` with the state
//! untouched. The second half applies the answer and runs the loop to the
//! next suspension.
//!
//! While a choice is open, the other players may already use or pass on
//! their optional responses to it.

use tracing::{debug, warn};

use super::command::Command;
use crate::core::{CharacterId, CommandError, EngineError, EventId, GameError, GameState, PlaceId};
use crate::entities::SliderPair;
use crate::events::{EventKind, Movement, Resource};
use crate::stack::{Suspension, Timing, UsableWindow};

/// A validated answer, ready to apply.
enum Answer {
    Choose { event: EventId, option: usize },
    Keep { event: EventId, candidate: usize },
    Spend { event: EventId, resource: Resource, delta: i32 },
    Roll(EventId),
    Slider { pair: SliderPair, position: u8, cost: u8 },
    DoneSliders(EventId),
    Move(Vec<PlaceId>),
    EndMovement(EventId),
    Use(usize, UsableWindow),
    DoneUsing(UsableWindow),
    Replace(String),
}

fn invalid(reason: impl Into<String>) -> CommandError {
    CommandError::invalid(reason)
}

fn owned_by(owner: Option<CharacterId>, sender: CharacterId) -> Result<(), CommandError> {
    match owner {
        Some(owner) if owner != sender => Err(CommandError::NotYourTurn(sender)),
        _ => Ok(()),
    }
}

impl GameState {
    /// Apply `command` from `character` and run to the next suspension.
    ///
    /// Rejections leave the state exactly as it was.
    pub fn handle(&mut self, character: CharacterId, command: Command) -> Result<Suspension, GameError> {
        let answer = match self.validate(character, &command) {
            Ok(answer) => answer,
            Err(GameError::Rejected(reason)) => {
                warn!(character = %character, command = command.name(), %reason, "command rejected");
                return Err(reason.into());
            }
            Err(fatal) => return Err(fatal),
        };
        debug!(character = %character, command = command.name(), "command");
        self.apply(character, answer)?;
        Ok(self.resolve_loop()?)
    }

    fn validate(&self, character: CharacterId, command: &Command) -> Result<Answer, GameError> {
        if self.stage().is_over() {
            return Err(CommandError::GameOver.into());
        }
        if self.character(character).is_err() {
            return Err(CommandError::UnknownCharacter(character).into());
        }
        let Some(pending) = self.pending()? else {
            return Err(invalid("nothing is waiting for a decision").into());
        };

        let answer = match (pending, command) {
            (Suspension::Choice { event, .. }, Command::Use(_) | Command::DoneUsing) => {
                let window = UsableWindow { event, timing: Timing::Before };
                let characters = self.usable_holders(window)?;
                self.validate_usable(window, &characters, character, command)?
            }
            (Suspension::Choice { event, character: owner }, _) => {
                self.validate_choice(event, owner, character, command)?
            }
            (Suspension::DiceRoll { event, character: owner }, Command::Roll) => {
                owned_by(owner, character)?;
                Answer::Roll(event)
            }
            (Suspension::Sliders { event, character: owner }, Command::SetSlider { pair, position }) => {
                owned_by(owner, character)?;
                self.validate_slider(event, character, *pair, *position)?
            }
            (Suspension::Sliders { event, character: owner }, Command::DoneSliders) => {
                owned_by(owner, character)?;
                Answer::DoneSliders(event)
            }
            (Suspension::Usable { event, timing, characters }, Command::Use(_) | Command::DoneUsing) => {
                self.validate_usable(UsableWindow { event, timing }, &characters, character, command)?
            }
            (Suspension::Replacement { characters }, Command::ChooseCharacter(name)) => {
                if !characters.contains(&character) {
                    return Err(CommandError::NotYourTurn(character).into());
                }
                if !self.templates().iter().any(|t| &t.name == name) {
                    return Err(invalid(format!("{name} is not available")).into());
                }
                Answer::Replace(name.clone())
            }
            (pending, command) => {
                return Err(invalid(format!(
                    "{} does not answer {}",
                    command.name(),
                    waiting_on(&pending)
                ))
                .into());
            }
        };
        Ok(answer)
    }

    fn validate_usable(
        &self,
        window: UsableWindow,
        holders: &[CharacterId],
        sender: CharacterId,
        command: &Command,
    ) -> Result<Answer, GameError> {
        if !holders.contains(&sender) {
            return Err(CommandError::NotYourTurn(sender).into());
        }
        match command {
            Command::Use(index) => {
                let offered = self.offered_to(sender, window)?;
                if *index >= offered {
                    return Err(invalid(format!("no usable #{index}, {offered} on offer")).into());
                }
                Ok(Answer::Use(*index, window))
            }
            _ => Ok(Answer::DoneUsing(window)),
        }
    }

    /// Choice-type events: multiple choice, keep-drawn and city movement.
    fn validate_choice(
        &self,
        event: EventId,
        owner: Option<CharacterId>,
        sender: CharacterId,
        command: &Command,
    ) -> Result<Answer, GameError> {
        let pending = self.event(event)?;
        let answer = match (&pending.kind, command) {
            (EventKind::MultipleChoice(choice), Command::Choose(label)) => {
                owned_by(owner, sender)?;
                let option = choice
                    .position(label)
                    .ok_or_else(|| invalid(format!("{label} is not an option")))?;
                if !choice.paid_for(option) {
                    return Err(invalid(format!("spent resources do not match the cost of {label}")).into());
                }
                Answer::Choose { event, option }
            }
            (EventKind::MultipleChoice(choice), Command::Spend(resource)) => {
                owned_by(owner, sender)?;
                if !choice.uses(*resource) {
                    return Err(invalid(format!("no option costs {}", resource.name())).into());
                }
                let spent = choice.spent().get(resource).copied().unwrap_or(0);
                if self.resource(sender, *resource)? - spent < 1 {
                    return Err(invalid(format!("no {} left to spend", resource.name())).into());
                }
                Answer::Spend { event, resource: *resource, delta: 1 }
            }
            (EventKind::MultipleChoice(choice), Command::Unspend(resource)) => {
                owned_by(owner, sender)?;
                if choice.spent().get(resource).copied().unwrap_or(0) < 1 {
                    return Err(invalid(format!("no {} spent", resource.name())).into());
                }
                Answer::Spend { event, resource: *resource, delta: -1 }
            }
            (EventKind::KeepDrawn(keep), Command::Choose(card)) => {
                owned_by(owner, sender)?;
                let candidate = keep
                    .remaining()
                    .find(|(_, name)| *name == card)
                    .map(|(i, _)| i)
                    .ok_or_else(|| invalid(format!("{card} was not drawn")))?;
                Answer::Keep { event, candidate }
            }
            (EventKind::CityMovement(_), Command::Move(destination)) => {
                owned_by(owner, sender)?;
                Answer::Move(self.validate_route(sender, *destination)?)
            }
            (EventKind::CityMovement(_), Command::EndMovement) => {
                owned_by(owner, sender)?;
                Answer::EndMovement(event)
            }
            (kind, command) => {
                return Err(invalid(format!("{} does not answer {}", command.name(), kind.name())).into());
            }
        };
        Ok(answer)
    }

    fn validate_slider(
        &self,
        event: EventId,
        character: CharacterId,
        pair: SliderPair,
        position: u8,
    ) -> Result<Answer, GameError> {
        let free = match &self.event(event)?.kind {
            EventKind::SliderInput(input) => input.is_free(),
            other => return Err(invalid(format!("{} is not a slider window", other.name())).into()),
        };
        if position >= self.config().slider_positions {
            return Err(invalid(format!("slider position {position} is off the track")).into());
        }
        let who = self.character(character)?;
        let cost = if free {
            0
        } else {
            who.slider(pair).abs_diff(position)
        };
        if cost > who.focus_points {
            return Err(invalid(format!("moving costs {cost} focus, {} left", who.focus_points)).into());
        }
        Ok(Answer::Slider { pair, position, cost })
    }

    fn validate_route(&self, character: CharacterId, destination: PlaceId) -> Result<Vec<PlaceId>, GameError> {
        let who = self.character(character)?;
        self.place(destination)
            .map_err(|_| invalid(format!("no place {destination}")))?;
        let Some(from) = who.place else {
            return Err(invalid("not on the board").into());
        };
        if from == destination {
            return Err(invalid("already there").into());
        }
        let budget = usize::try_from(who.movement_points.max(0)).unwrap_or(0);
        let limit = budget.min(usize::from(self.config().max_route_len));
        self.route(from, destination, limit).ok_or_else(|| {
            invalid(format!(
                "cannot reach {destination} with {} movement points",
                who.movement_points
            ))
            .into()
        })
    }

    /// How many optional responses are on offer to `character` in `window`.
    fn offered_to(&self, character: CharacterId, window: UsableWindow) -> Result<usize, EngineError> {
        let event = self.event(window.event)?;
        Ok(self
            .usables_for(window.event, event, window.timing)
            .iter()
            .filter(|u| u.character == character)
            .count())
    }

    fn apply(&mut self, character: CharacterId, answer: Answer) -> Result<(), EngineError> {
        match answer {
            Answer::Choose { event, option } => {
                let spent = match &mut self.event_mut(event)?.kind {
                    EventKind::MultipleChoice(choice) => {
                        choice.chosen = Some(option);
                        choice.spent.clone()
                    }
                    _ => return Ok(()),
                };
                for (resource, amount) in spent {
                    let left = self.resource(character, resource)? - amount;
                    self.set_resource(character, resource, left)?;
                }
            }
            Answer::Keep { event, candidate } => {
                if let EventKind::KeepDrawn(keep) = &mut self.event_mut(event)?.kind {
                    keep.kept.push(candidate);
                }
            }
            Answer::Spend { event, resource, delta } => {
                if let EventKind::MultipleChoice(choice) = &mut self.event_mut(event)?.kind {
                    let spent = choice.spent.entry(resource).or_insert(0);
                    *spent += delta;
                    if *spent == 0 {
                        choice.spent.remove(&resource);
                    }
                }
            }
            Answer::Roll(event) => {
                if let EventKind::DiceRoll(roll) = &mut self.event_mut(event)?.kind {
                    roll.roll_requested = true;
                }
            }
            Answer::Slider { pair, position, cost } => {
                let who = self.character_mut(character)?;
                who.focus_points -= cost;
                who.sliders[pair.index()] = position;
            }
            Answer::DoneSliders(event) => {
                if let EventKind::SliderInput(input) = &mut self.event_mut(event)?.kind {
                    input.finished = true;
                }
            }
            Answer::Move(route) => {
                self.push_event(Movement::new(character, route));
            }
            Answer::EndMovement(event) => {
                if let EventKind::CityMovement(movement) = &mut self.event_mut(event)?.kind {
                    movement.ended = true;
                }
            }
            Answer::Use(index, window) => {
                let event = self.event(window.event)?;
                let usable = self
                    .usables_for(window.event, event, window.timing)
                    .into_iter()
                    .filter(|u| u.character == character)
                    .nth(index);
                if let Some(usable) = usable {
                    self.push_event(usable.event);
                }
            }
            Answer::DoneUsing(window) => {
                self.stack_mut().mark_done(window, character);
            }
            Answer::Replace(name) => {
                self.replace_character(character, &name)?;
            }
        }
        Ok(())
    }
}

fn waiting_on(pending: &Suspension) -> &'static str {
    match pending {
        Suspension::Choice { .. } => "a choice",
        Suspension::DiceRoll { .. } => "a dice roll",
        Suspension::Sliders { .. } => "slider setting",
        Suspension::Usable { .. } => "optional responses",
        Suspension::Replacement { .. } => "a replacement character",
        Suspension::Idle => "nothing",
        Suspension::GameOver(_) => "a finished game",
    }
}
