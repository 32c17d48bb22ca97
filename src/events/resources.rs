//! Stat changes, status flags, knock-outs and death.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{who, EventRef, Resolve};
use crate::core::{CharacterId, EngineError, GameState};
use crate::decks::{DeckId, DeckPosition};
use crate::entities::{MonsterLocation, Trophy};
use crate::values::Value;

/// Countable character resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Stamina,
    Sanity,
    Dollars,
    Clues,
    MovementPoints,
}

impl Resource {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Resource::Stamina => "stamina",
            Resource::Sanity => "sanity",
            Resource::Dollars => "dollars",
            Resource::Clues => "clues",
            Resource::MovementPoints => "movement_points",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "stamina" => Resource::Stamina,
            "sanity" => Resource::Sanity,
            "dollars" => Resource::Dollars,
            "clues" => Resource::Clues,
            "movement_points" => Resource::MovementPoints,
            _ => return None,
        })
    }
}

/// Gain and lose resources in one step.
///
/// Dice-valued amounts are rolled first as sub-events. The applied change is
/// clamped (stamina and sanity at their current maximum, everything at zero)
/// and `final_adjustments` records what actually changed, which may differ
/// from what was asked for.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GainOrLoss {
    character: CharacterId,
    gains: BTreeMap<Resource, Value>,
    losses: BTreeMap<Resource, Value>,
    final_adjustments: Option<BTreeMap<Resource, i32>>,
}

impl GainOrLoss {
    #[must_use]
    pub fn new(
        character: CharacterId,
        gains: BTreeMap<Resource, Value>,
        losses: BTreeMap<Resource, Value>,
    ) -> Self {
        Self {
            character,
            gains,
            losses,
            final_adjustments: None,
        }
    }

    #[must_use]
    pub fn gain(character: CharacterId, resource: Resource, amount: impl Into<Value>) -> Self {
        Self::new(
            character,
            BTreeMap::from([(resource, amount.into())]),
            BTreeMap::new(),
        )
    }

    #[must_use]
    pub fn loss(character: CharacterId, resource: Resource, amount: impl Into<Value>) -> Self {
        Self::new(
            character,
            BTreeMap::new(),
            BTreeMap::from([(resource, amount.into())]),
        )
    }

    /// Add another amount to gain.
    #[must_use]
    pub fn and_gain(mut self, resource: Resource, amount: impl Into<Value>) -> Self {
        self.gains.insert(resource, amount.into());
        self
    }

    /// Add another amount to lose.
    #[must_use]
    pub fn and_lose(mut self, resource: Resource, amount: impl Into<Value>) -> Self {
        self.losses.insert(resource, amount.into());
        self
    }

    #[must_use]
    pub fn final_adjustments(&self) -> Option<&BTreeMap<Resource, i32>> {
        self.final_adjustments.as_ref()
    }

    /// Whether this lowered `resource` (after prevention and clamping).
    #[must_use]
    pub fn lost(&self, resource: Resource) -> bool {
        self.final_adjustments
            .as_ref()
            .and_then(|adj| adj.get(&resource))
            .is_some_and(|&delta| delta < 0)
    }

    fn apply(&self, state: &mut GameState, resource: Resource, delta: f64) -> Result<i32, EngineError> {
        let before = state.resource(self.character, resource)?;
        let cap = match resource {
            Resource::Stamina => f64::from(state.max_stamina(self.character)?.max(before)),
            Resource::Sanity => f64::from(state.max_sanity(self.character)?.max(before)),
            _ => f64::from(i32::MAX),
        };
        let delta = if delta.is_nan() { 0.0 } else { delta };
        let after = (f64::from(before) + delta).min(cap).max(0.0).floor() as i32;
        state.set_resource(self.character, resource, after)?;
        Ok(after - before)
    }
}

impl Resolve for GainOrLoss {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        for amount in self.gains.values().chain(self.losses.values()) {
            if let Some(roll) = amount.pending_roll(state)? {
                state.push_existing(roll);
                return Ok(false);
            }
        }

        let mut deltas: BTreeMap<Resource, f64> = BTreeMap::new();
        for (resource, amount) in &self.gains {
            *deltas.entry(*resource).or_default() += amount.value(state)?;
        }
        for (resource, amount) in &self.losses {
            *deltas.entry(*resource).or_default() -= amount.value(state)?;
        }

        let mut applied = BTreeMap::new();
        for (resource, delta) in deltas {
            applied.insert(resource, self.apply(state, resource, delta)?);
        }
        self.final_adjustments = Some(applied);
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.final_adjustments.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        let parts: Vec<String> = match &self.final_adjustments {
            Some(applied) => applied
                .iter()
                .map(|(resource, delta)| match delta {
                    d if *d >= 0 => format!("gains {d} {}", resource.name()),
                    d => format!("loses {} {}", -d, resource.name()),
                })
                .collect(),
            None => self
                .gains
                .iter()
                .map(|(r, v)| format!("gains {} {}", v.describe(), r.name()))
                .chain(
                    self.losses
                        .iter()
                        .map(|(r, v)| format!("loses {} {}", v.describe(), r.name())),
                )
                .collect(),
        };
        format!("{name} {}", parts.join(" and "))
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        let resource = Resource::from_name(name)?;
        self.final_adjustments
            .as_ref()
            .map(|adj| f64::from(adj.get(&resource).copied().unwrap_or(0)))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        for amount in self.gains.values_mut().chain(self.losses.values_mut()) {
            amount.visit_refs(f);
        }
    }
}

/// Character status flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Retainer,
    LodgeMembership,
    Delayed,
    Arrested,
    LoseTurn,
    /// Signed axis: +1 blessed, -1 cursed.
    BlessCurse,
}

/// Set, clear or shift a status. Records the delta actually applied.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusChange {
    character: CharacterId,
    status: Status,
    change: i8,
    delta: Option<i8>,
}

impl StatusChange {
    /// `change > 0` sets (or blesses), `change < 0` clears (or curses).
    #[must_use]
    pub fn new(character: CharacterId, status: Status, change: i8) -> Self {
        Self {
            character,
            status,
            change,
            delta: None,
        }
    }
}

fn toggle(flag: &mut bool, on: bool) -> i8 {
    let delta = i8::from(on) - i8::from(*flag);
    *flag = on;
    delta
}

fn until(slot: &mut Option<u32>, on: bool, through: u32) -> i8 {
    let was = slot.is_some();
    *slot = on.then_some(through);
    i8::from(on) - i8::from(was)
}

impl Resolve for StatusChange {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let through = state.turn_number() + 1;
        let on = self.change > 0;
        let character = state.character_mut(self.character)?;
        let delta = match self.status {
            Status::Retainer => toggle(&mut character.retainer, on),
            Status::LodgeMembership => toggle(&mut character.lodge_membership, on),
            Status::Delayed => toggle(&mut character.delayed, on),
            Status::Arrested => until(&mut character.arrested_until, on, through),
            Status::LoseTurn => until(&mut character.lose_turn_until, on, through),
            Status::BlessCurse => {
                let before = character.bless_curse;
                character.bless_curse = (before.saturating_add(self.change)).clamp(-1, 1);
                character.bless_curse - before
            }
        };
        self.delta = Some(delta);
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.delta.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match (self.status, self.delta) {
            (_, Some(0)) => format!("{name}: {:?} is unchanged", self.status),
            (Status::BlessCurse, _) if self.change > 0 => format!("{name} is blessed"),
            (Status::BlessCurse, _) => format!("{name} is cursed"),
            (status, _) if self.change > 0 => format!("{name} gains {status:?}"),
            (status, _) => format!("{name} loses {status:?}"),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "delta" => self.delta.map(f64::from),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Stamina or sanity dropped to zero.
///
/// The character is set back to 1 in the exhausted stat, loses half their
/// clues (rounded down), wakes at the configured recovery place and loses
/// their next turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnockedOut {
    character: CharacterId,
    cause: Resource,
    done: bool,
}

impl KnockedOut {
    #[must_use]
    pub fn new(character: CharacterId, cause: Resource) -> Self {
        Self {
            character,
            cause,
            done: false,
        }
    }
}

impl Resolve for KnockedOut {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let recovery = match self.cause {
            Resource::Sanity => state.config().asylum.clone(),
            _ => state.config().hospital.clone(),
        }
        .and_then(|name| state.place_by_name(&name));
        let through = state.turn_number() + 1;

        let character = state.character_mut(self.character)?;
        match self.cause {
            Resource::Sanity => character.sanity = character.sanity.max(1),
            _ => character.stamina = character.stamina.max(1),
        }
        character.clues -= character.clues / 2;
        character.movement_points = 0;
        character.lose_turn_until = Some(through);
        if recovery.is_some() {
            character.place = recovery;
        }
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match self.cause {
            Resource::Sanity => format!("{name} is driven insane"),
            _ => format!("{name} is knocked unconscious"),
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// The character leaves the game. Possessions return to the bottom of their
/// decks and monster trophies return to the cup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Devoured {
    character: CharacterId,
    done: bool,
}

impl Devoured {
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            done: false,
        }
    }
}

impl Resolve for Devoured {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let character = state.character_mut(self.character)?;
        character.gone = true;
        character.devoured = true;
        character.place = None;
        character.movement_points = 0;
        let possessions = std::mem::take(&mut character.possessions);
        let trophies = std::mem::take(&mut character.trophies);

        for possession in possessions {
            if let Some(deck) = DeckId::for_possession(possession.kind) {
                state.decks_mut().add(deck, possession.name, DeckPosition::Bottom);
            }
        }
        for trophy in trophies {
            if let Trophy::Monster(monster) = trophy {
                state.monster_mut(monster)?.location = MonsterLocation::Cup;
            }
        }
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        format!("{} is devoured", who(state, Some(self.character)))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}
