//! Root events of the turn phases.
//!
//! `next_turn` pushes one of these per character and phase. Each does its
//! bookkeeping, then pushes at most one child (the part players interact
//! with) and finishes when that child is done.

use serde::{Deserialize, Serialize};

use super::{
    who, Check, CityMovement, CounterChange, Event, EventRef, ForceMovement, GainOrLoss, Nothing,
    Resolve, Resource, Sequence, SliderInput, Status, StatusChange,
};
use crate::core::{CharacterId, EngineError, EventId, GameState, GlobalSlot};
use crate::decks::{DeckId, DeckPosition};
use crate::entities::{CheckType, PlaceKind};
use crate::rules::GameStage;

/// Shared progress of a phase root: either finished on the spot or waiting
/// on the one child it pushed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct PhaseProgress {
    child: Option<EventId>,
    done: bool,
    skipped: bool,
}

impl PhaseProgress {
    fn push(&mut self, state: &mut GameState, event: impl Into<Event>) -> Result<bool, EngineError> {
        self.child = Some(state.push_event(event));
        Ok(false)
    }

    fn finish(&mut self) -> Result<bool, EngineError> {
        self.done = true;
        Ok(true)
    }

    fn skip(&mut self) -> Result<bool, EngineError> {
        self.skipped = true;
        self.finish()
    }
}

fn loses_turn(state: &GameState, character: CharacterId) -> Result<bool, EngineError> {
    let turn = state.turn_number();
    Ok(state.character(character)?.loses_turn(turn))
}

/// Upkeep: refresh exhausted possessions, restore focus, expire statuses,
/// pay retainers, then let the character adjust sliders.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Upkeep {
    character: CharacterId,
    progress: PhaseProgress,
}

impl Upkeep {
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            progress: PhaseProgress::default(),
        }
    }
}

impl Resolve for Upkeep {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.progress.child.is_some() {
            return self.progress.finish();
        }

        let turn = state.turn_number();
        let character = state.character_mut(self.character)?;
        for possession in &mut character.possessions {
            possession.exhausted = false;
        }
        character.focus_points = character.focus;
        if character.arrested_until.is_some_and(|until| until < turn) {
            character.arrested_until = None;
        }
        if character.lose_turn_until.is_some_and(|until| until < turn) {
            character.lose_turn_until = None;
        }
        let retainer = character.retainer;

        if loses_turn(state, self.character)? {
            return self.progress.skip();
        }

        let mut steps: Vec<EventRef> = Vec::new();
        if retainer {
            steps.push(GainOrLoss::gain(self.character, Resource::Dollars, 2).into());
        }
        steps.push(SliderInput::new(self.character, false).into());
        let upkeep = Sequence::new(Some(self.character), steps);
        self.progress.push(state, upkeep)
    }

    fn is_resolved(&self) -> bool {
        self.progress.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        if self.progress.skipped {
            format!("{name} loses their upkeep")
        } else {
            format!("{name}'s upkeep")
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Movement phase: delayed characters only stand up; everyone else gets
/// movement points equal to their speed and moves through the city.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MovementPhase {
    character: CharacterId,
    progress: PhaseProgress,
}

impl MovementPhase {
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            progress: PhaseProgress::default(),
        }
    }
}

impl Resolve for MovementPhase {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.progress.child.is_some() {
            return self.progress.finish();
        }
        if loses_turn(state, self.character)? {
            return self.progress.skip();
        }
        if state.character(self.character)?.delayed {
            let recover = StatusChange::new(self.character, Status::Delayed, -1);
            return self.progress.push(state, recover);
        }

        let speed = state.stat(self.character, CheckType::Speed)?;
        let in_city = state
            .character(self.character)?
            .place
            .map(|p| state.place(p))
            .transpose()?
            .is_some_and(|p| p.kind != PlaceKind::OtherWorld);
        if !in_city {
            return self.progress.skip();
        }
        state.character_mut(self.character)?.movement_points = speed.max(0);
        self.progress.push(state, CityMovement::new(self.character))
    }

    fn is_resolved(&self) -> bool {
        self.progress.done
    }

    fn log(&self, state: &GameState) -> String {
        format!("{}'s movement", who(state, Some(self.character)))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Encounter phase in the city: an open gate pulls the character through,
/// otherwise a location runs its registered encounter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncounterPhase {
    character: CharacterId,
    progress: PhaseProgress,
}

impl EncounterPhase {
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            progress: PhaseProgress::default(),
        }
    }
}

impl Resolve for EncounterPhase {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.progress.child.is_some() {
            return self.progress.finish();
        }
        if loses_turn(state, self.character)? {
            return self.progress.skip();
        }
        let Some(place_id) = state.character(self.character)?.place else {
            return self.progress.skip();
        };
        let place = state.place(place_id)?;
        if let Some(gate) = &place.gate {
            let through = ForceMovement::new(self.character, gate.world);
            return self.progress.push(state, through);
        }
        if place.kind != PlaceKind::Location {
            return self.progress.skip();
        }

        let encounter = match state.registry().encounter(&place.name) {
            Some(factory) => factory(Some(self.character), state)?,
            None => Nothing::new().into(),
        };
        self.progress.push(state, encounter)
    }

    fn is_resolved(&self) -> bool {
        self.progress.done
    }

    fn log(&self, state: &GameState) -> String {
        format!("{}'s encounter", who(state, Some(self.character)))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Encounter phase in another world: draw a gate card, run the encounter
/// for it, and put the card on the bottom.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OtherworldPhase {
    character: CharacterId,
    card: Option<String>,
    progress: PhaseProgress,
}

impl OtherworldPhase {
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            card: None,
            progress: PhaseProgress::default(),
        }
    }
}

impl Resolve for OtherworldPhase {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.progress.child.is_some() {
            return self.progress.finish();
        }
        if loses_turn(state, self.character)? {
            return self.progress.skip();
        }
        let elsewhere = state
            .character(self.character)?
            .place
            .map(|p| state.place(p))
            .transpose()?
            .is_some_and(|p| p.kind == PlaceKind::OtherWorld);
        if !elsewhere {
            return self.progress.skip();
        }
        let Some(card) = state.decks_mut().draw(DeckId::GateCards) else {
            return self.progress.skip();
        };
        state.decks_mut().add(DeckId::GateCards, card.clone(), DeckPosition::Bottom);

        let encounter = match state.registry().gate_encounter(&card) {
            Some(factory) => factory(Some(self.character), state)?,
            None => Nothing::new().into(),
        };
        self.card = Some(card);
        self.progress.push(state, encounter)
    }

    fn is_resolved(&self) -> bool {
        self.progress.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match &self.card {
            Some(card) => format!("{name} draws the gate card {card}"),
            None => format!("{name}'s other world encounter"),
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Mythos phase: the first player draws the top mythos card, which goes to
/// the bottom after its effect is pushed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mythos {
    first_player: CharacterId,
    card: Option<String>,
    progress: PhaseProgress,
}

impl Mythos {
    #[must_use]
    pub fn new(first_player: CharacterId) -> Self {
        Self {
            first_player,
            card: None,
            progress: PhaseProgress::default(),
        }
    }
}

impl Resolve for Mythos {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.progress.child.is_some() {
            return self.progress.finish();
        }
        let Some(card) = state.decks_mut().draw(DeckId::Mythos) else {
            return self.progress.skip();
        };
        state.decks_mut().add(DeckId::Mythos, card.clone(), DeckPosition::Bottom);

        let effect = match state.registry().mythos(&card) {
            Some(factory) => factory(Some(self.first_player), state)?,
            None => Nothing::new().into(),
        };
        self.card = Some(card);
        self.progress.push(state, effect)
    }

    fn is_resolved(&self) -> bool {
        self.progress.done
    }

    fn log(&self, _state: &GameState) -> String {
        match &self.card {
            Some(card) => format!("Mythos: {card}"),
            None if self.progress.skipped => "The mythos deck is empty".to_string(),
            None => "Mythos".to_string(),
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.first_player)
    }
}

/// The ancient one wakes. The turn order switches to the final battle at
/// the next turn boundary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Awaken {
    done: bool,
}

impl Awaken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Resolve for Awaken {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        state.set_stage(GameStage::Awakened);
        state.turn_mut().fresh_round = true;
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = state
            .global(GlobalSlot::AncientOne)
            .map_or_else(|| "The ancient one".to_string(), |g| g.name.clone());
        format!("{name} awakens")
    }
}

/// One investigator's attack on the awakened ancient one. Successes pile up
/// as hits; every full round of hits (one per living investigator) removes a
/// doom token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvestigatorAttack {
    character: CharacterId,
    check: Option<EventId>,
    removal: Option<EventId>,
    removed: Option<i64>,
    done: bool,
}

impl InvestigatorAttack {
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            check: None,
            removal: None,
            removed: None,
            done: false,
        }
    }
}

impl Resolve for InvestigatorAttack {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.removal.is_some() {
            self.done = true;
            return Ok(true);
        }
        let Some(check) = self.check else {
            let rating = state
                .global(GlobalSlot::AncientOne)
                .and_then(|g| g.counter("combat_rating"))
                .unwrap_or(0);
            let check = Check::new(self.character, CheckType::Combat, rating as f64);
            self.check = Some(state.push_event(check));
            return Ok(false);
        };

        let successes = state.event(check)?.attribute("successes").unwrap_or(0.0) as i64;
        let living = state.living_characters().len().max(1) as i64;
        let ancient = state
            .global_mut(GlobalSlot::AncientOne)
            .ok_or_else(|| EngineError::MissingContent(GlobalSlot::AncientOne.to_string()))?;
        let hits = ancient.counter("hits").unwrap_or(0) + successes;
        let removed = hits / living;
        ancient.set_counter("hits".to_string(), hits % living);
        self.removed = Some(removed);

        if removed == 0 {
            self.done = true;
            return Ok(true);
        }
        let removal = CounterChange::new(GlobalSlot::AncientOne, "doom", -(removed as f64));
        self.removal = Some(state.push_event(removal));
        Ok(false)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match self.removed {
            Some(0) => format!("{name} attacks but removes no doom"),
            Some(n) => format!("{name} removes {n} doom"),
            None => format!("{name} attacks the ancient one"),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "removed" => self.removed.map(|n| n as f64),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// The ancient one strikes back, as registered for its name. Without a
/// registered attack every living investigator loses 1 stamina.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AncientAttack {
    progress: PhaseProgress,
}

impl AncientAttack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Resolve for AncientAttack {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.progress.child.is_some() {
            return self.progress.finish();
        }
        let name = state.global(GlobalSlot::AncientOne).map(|g| g.name.clone());
        let registered = name.as_deref().and_then(|n| state.registry().ancient_attack(n));
        let attack = match registered {
            Some(factory) => factory(None, state)?,
            None => {
                let losses: Vec<EventRef> = state
                    .living_characters()
                    .into_iter()
                    .map(|c| EventRef::from(GainOrLoss::loss(c, Resource::Stamina, 1)))
                    .collect();
                Sequence::new(None, losses).into()
            }
        };
        self.progress.push(state, attack)
    }

    fn is_resolved(&self) -> bool {
        self.progress.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = state
            .global(GlobalSlot::AncientOne)
            .map_or_else(|| "The ancient one".to_string(), |g| g.name.clone());
        format!("{name} attacks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_skip_marks_done() {
        let mut progress = PhaseProgress::default();
        assert_eq!(progress.skip(), Ok(true));
        assert!(progress.done);
        assert!(progress.skipped);
        assert!(progress.child.is_none());
    }
}
