//! Turn and phase rotation.
//!
//! While the ancient one sleeps every phase runs once per living character,
//! starting with the first player:
//!
//! ```text
//! upkeep -> movement -> encounter -> otherworld -> mythos -> (next round)
//! ```
//!
//! Mythos runs once, for the first player. At its end the turn number goes
//! up and the first player passes to the next living seat. Once the ancient
//! one wakes the rotation becomes:
//!
//! ```text
//! upkeep -> attack -> ancient -> (next round)
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use super::GameStage;
use crate::core::{CharacterId, EngineError, GameState};
use crate::events::{
    AncientAttack, EncounterPhase, Event, EventRef, InvestigatorAttack, MovementPhase, Mythos,
    OtherworldPhase, Sequence, SliderInput, Upkeep,
};
use crate::stack::Suspension;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    Upkeep,
    Movement,
    Encounter,
    Otherworld,
    Mythos,
    Attack,
    Ancient,
}

impl TurnPhase {
    /// Phase after this one within a round, or `None` when the round ends.
    #[must_use]
    pub fn next(self, stage: GameStage) -> Option<TurnPhase> {
        match (stage, self) {
            (GameStage::Awakened, TurnPhase::Upkeep) => Some(TurnPhase::Attack),
            (GameStage::Awakened, TurnPhase::Attack) => Some(TurnPhase::Ancient),
            (GameStage::Awakened, _) => None,
            (_, TurnPhase::Upkeep) => Some(TurnPhase::Movement),
            (_, TurnPhase::Movement) => Some(TurnPhase::Encounter),
            (_, TurnPhase::Encounter) => Some(TurnPhase::Otherworld),
            (_, TurnPhase::Otherworld) => Some(TurnPhase::Mythos),
            _ => None,
        }
    }

    /// Runs once per round rather than once per character.
    #[must_use]
    pub fn is_shared(self) -> bool {
        matches!(self, TurnPhase::Mythos | TurnPhase::Ancient)
    }
}

/// Where the rotation stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTracker {
    pub number: u32,
    pub phase: TurnPhase,
    pub first_player: CharacterId,
    pub current: CharacterId,
    /// The next turn boundary starts a new round from upkeep.
    pub fresh_round: bool,
}

impl Default for TurnTracker {
    fn default() -> Self {
        Self {
            number: 0,
            phase: TurnPhase::Upkeep,
            first_player: CharacterId::new(0),
            current: CharacterId::new(0),
            fresh_round: false,
        }
    }
}

impl GameState {
    /// Open setup: every character sets their sliders for free. Runs the
    /// loop to the first decision.
    pub fn start(&mut self) -> Result<Suspension, EngineError> {
        let setup: Vec<EventRef> = self
            .living_characters()
            .into_iter()
            .map(|c| EventRef::from(SliderInput::new(c, true)))
            .collect();
        self.push_event(Sequence::new(None, setup));
        info!(characters = self.living_characters().len(), "game started");
        self.resolve_loop()
    }

    /// Living seat after `from` in rotation order starting at the first
    /// player, or `None` once the rotation has come full circle.
    fn next_seat(&self, from: CharacterId) -> Option<CharacterId> {
        let seats = self.character_count();
        if seats == 0 {
            return None;
        }
        let first = self.turn().first_player.index();
        let distance = |seat: usize| (seat + seats - first) % seats;
        let after = distance(from.index());
        self.living_characters()
            .into_iter()
            .filter(|c| distance(c.index()) > after)
            .min_by_key(|c| distance(c.index()))
    }

    /// First living seat at or after `seat`.
    fn living_from(&self, seat: CharacterId) -> Option<CharacterId> {
        let seats = self.character_count();
        let living = self.living_characters();
        (0..seats)
            .map(|offset| CharacterId::new(((seat.index() + offset) % seats) as u8))
            .find(|c| living.contains(c))
    }

    fn phase_root(&self, phase: TurnPhase, character: CharacterId) -> Event {
        match phase {
            TurnPhase::Upkeep => Upkeep::new(character).into(),
            TurnPhase::Movement => MovementPhase::new(character).into(),
            TurnPhase::Encounter => EncounterPhase::new(character).into(),
            TurnPhase::Otherworld => OtherworldPhase::new(character).into(),
            TurnPhase::Mythos => Mythos::new(character).into(),
            TurnPhase::Attack => InvestigatorAttack::new(character).into(),
            TurnPhase::Ancient => AncientAttack::new().into(),
        }
    }

    /// Seats waiting to choose a replacement character.
    #[must_use]
    pub fn unfilled_seats(&self) -> Vec<CharacterId> {
        if self.stage() != GameStage::Slumber || !self.has_templates() {
            return Vec::new();
        }
        self.character_ids()
            .filter(|&c| self.character(c).is_ok_and(|who| who.devoured))
            .collect()
    }

    /// Advance the rotation and push the next phase root.
    ///
    /// Returns a suspension instead when the game cannot advance: a devoured
    /// seat still needs a replacement, or nobody is left.
    pub fn next_turn(&mut self) -> Result<Option<Suspension>, EngineError> {
        match self.stage() {
            GameStage::Victory | GameStage::Defeat => {
                return Ok(Some(Suspension::GameOver(self.stage())));
            }
            GameStage::Setup => {
                self.set_stage(GameStage::Slumber);
                let first = self.living_from(CharacterId::new(0));
                let turn = self.turn_mut();
                turn.number = 1;
                turn.phase = TurnPhase::Upkeep;
                if let Some(first) = first {
                    turn.first_player = first;
                    turn.current = first;
                }
                return self.push_phase();
            }
            GameStage::Slumber | GameStage::Awakened => {}
        }

        if self.turn().fresh_round {
            self.turn_mut().fresh_round = false;
            self.begin_round(false);
            return self.push_phase();
        }

        let stage = self.stage();
        let turn = self.turn().clone();
        let next_player = (!turn.phase.is_shared())
            .then(|| self.next_seat(turn.current))
            .flatten();

        match (next_player, turn.phase.next(stage)) {
            (Some(next), _) => self.turn_mut().current = next,
            (None, Some(phase)) => {
                let first = self.living_from(turn.first_player);
                let tracker = self.turn_mut();
                tracker.phase = phase;
                if let Some(first) = first {
                    tracker.current = first;
                }
            }
            (None, None) => {
                if turn.phase == TurnPhase::Mythos {
                    let unfilled = self.unfilled_seats();
                    if !unfilled.is_empty() {
                        return Ok(Some(Suspension::Replacement { characters: unfilled }));
                    }
                }
                self.begin_round(stage == GameStage::Slumber);
            }
        }
        self.push_phase()
    }

    /// Start a new round at upkeep. `rotate` passes the first player token.
    fn begin_round(&mut self, rotate: bool) {
        let seats = self.character_count().max(1);
        let first = self.turn().first_player;
        let first = if rotate {
            self.living_from(CharacterId::new(((first.index() + 1) % seats) as u8))
        } else {
            self.living_from(first)
        };
        let tracker = self.turn_mut();
        tracker.number += 1;
        tracker.phase = TurnPhase::Upkeep;
        if let Some(first) = first {
            tracker.first_player = first;
            tracker.current = first;
        }
        info!(turn = tracker.number, first_player = %tracker.first_player, "new round");
    }

    fn push_phase(&mut self) -> Result<Option<Suspension>, EngineError> {
        if self.living_characters().is_empty() && self.unfilled_seats().is_empty() {
            self.set_stage(GameStage::Defeat);
            return Ok(Some(Suspension::GameOver(GameStage::Defeat)));
        }
        let turn = self.turn().clone();
        info!(turn = turn.number, phase = ?turn.phase, character = %turn.current, "phase");
        let root = self.phase_root(turn.phase, turn.current);
        self.push_event(root);
        Ok(None)
    }
}
