//! Control-flow events: composition, branching, cancellation and global
//! counters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{push_unresolved, who, EventRef, Resolve};
use crate::core::{CharacterId, EngineError, EventId, GameState, GlobalSlot};
use crate::rules::GameStage;
use crate::values::Value;

/// No effect.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Nothing {
    done: bool,
}

impl Nothing {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Resolve for Nothing {
    fn resolve(&mut self, _state: &mut GameState) -> Result<bool, EngineError> {
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, _state: &GameState) -> String {
        "Nothing happens".to_string()
    }
}

/// Children resolve strictly left to right.
///
/// Each tick pushes the first unresolved child in declaration order, so a
/// later child that happens to be resolved already never jumps the queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sequence {
    character: Option<CharacterId>,
    events: Vec<EventRef>,
    done: bool,
}

impl Sequence {
    #[must_use]
    pub fn new(character: Option<CharacterId>, events: Vec<EventRef>) -> Self {
        Self {
            character,
            events,
            done: false,
        }
    }
}

impl Resolve for Sequence {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        for child in &self.events {
            if push_unresolved(state, child.id()?)? {
                return Ok(false);
            }
        }
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        format!("{}: {} steps", who(state, self.character), self.events.len())
    }

    fn character(&self) -> Option<CharacterId> {
        self.character
    }

    fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        self.events.iter_mut().for_each(f);
    }

    fn flatten(&self) -> bool {
        true
    }
}

/// What a conditional branches on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Condition {
    /// An outcome field of another event, resolved first if needed.
    Event { event: EventRef, field: String },
    /// Any value. Pending dice inside it are rolled first.
    Value(Value),
}

impl Condition {
    /// Branch on `field` of `event` (e.g. a check's `successes`).
    #[must_use]
    pub fn on(event: impl Into<EventRef>, field: impl Into<String>) -> Self {
        Condition::Event {
            event: event.into(),
            field: field.into(),
        }
    }

    fn pending(&self, state: &GameState) -> Result<Option<EventId>, EngineError> {
        match self {
            Condition::Event { event, .. } => {
                let id = event.id()?;
                Ok((!state.event(id)?.is_resolved()).then_some(id))
            }
            Condition::Value(value) => value.pending_roll(state),
        }
    }

    /// Whether the event branched on was prevented. Prevented dice inside a
    /// value sum to zero instead.
    fn prevented(&self, state: &GameState) -> Result<bool, EngineError> {
        match self {
            Condition::Event { event, .. } => Ok(state.event(event.id()?)?.is_cancelled()),
            Condition::Value(_) => Ok(false),
        }
    }

    fn observe(&self, state: &GameState) -> Result<f64, EngineError> {
        match self {
            Condition::Event { event, field } => {
                let id = event.id()?;
                state
                    .event(id)?
                    .attribute(field)
                    .ok_or_else(|| EngineError::missing(id, field))
            }
            Condition::Value(value) => value.value(state),
        }
    }
}

/// Floor lookup over a sparse integer-keyed outcome map.
///
/// The outcome keyed by the greatest threshold at or below the observed
/// value is resolved. Construction requires a catch-all keyed at or below 0.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conditional {
    character: Option<CharacterId>,
    condition: Condition,
    outcomes: BTreeMap<i64, EventRef>,
    chosen: Option<i64>,
    prevented: bool,
    done: bool,
}

impl Conditional {
    pub fn new<E: Into<EventRef>>(
        character: Option<CharacterId>,
        condition: Condition,
        outcomes: impl IntoIterator<Item = (i64, E)>,
    ) -> Result<Self, EngineError> {
        let outcomes: BTreeMap<i64, EventRef> =
            outcomes.into_iter().map(|(k, e)| (k, e.into())).collect();
        match outcomes.keys().next() {
            Some(&lowest) if lowest <= 0 => {}
            lowest => {
                return Err(EngineError::MissingCatchAll {
                    lowest: lowest.copied(),
                })
            }
        }
        Ok(Self {
            character,
            condition,
            outcomes,
            chosen: None,
            prevented: false,
            done: false,
        })
    }

    /// Pass/fail on a value: `pass` when it is at least 1.
    pub fn pass_fail(
        character: Option<CharacterId>,
        condition: Condition,
        pass: impl Into<EventRef>,
        fail: impl Into<EventRef>,
    ) -> Result<Self, EngineError> {
        let outcomes: [(i64, EventRef); 2] = [(0, fail.into()), (1, pass.into())];
        Self::new(character, condition, outcomes)
    }

    fn select(&self, observed: f64) -> Result<i64, EngineError> {
        if observed.is_nan() {
            return Err(EngineError::NoThreshold { observed });
        }
        // Saturating cast keeps infinities at the map's ends.
        let key = observed.floor() as i64;
        self.outcomes
            .range(..=key)
            .next_back()
            .map(|(k, _)| *k)
            .ok_or(EngineError::NoThreshold { observed })
    }
}

impl Resolve for Conditional {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if let Some(pending) = self.condition.pending(state)? {
            state.push_existing(pending);
            return Ok(false);
        }
        if self.chosen.is_none() && self.condition.prevented(state)? {
            // Nothing to branch on: no outcome applies.
            self.prevented = true;
            self.done = true;
            return Ok(true);
        }
        let key = match self.chosen {
            Some(key) => key,
            None => {
                let key = self.select(self.condition.observe(state)?)?;
                self.chosen = Some(key);
                key
            }
        };
        let outcome = self
            .outcomes
            .get(&key)
            .ok_or(EngineError::NoThreshold { observed: key as f64 })?
            .id()?;
        if push_unresolved(state, outcome)? {
            return Ok(false);
        }
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, self.character);
        match self.chosen {
            Some(key) => format!("{name}: outcome {key}"),
            None if self.prevented => format!("{name}: no outcome, the condition was prevented"),
            None => format!("{name}: conditional"),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "outcome" => self.chosen.map(|k| k as f64),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        self.character
    }

    fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        match &mut self.condition {
            Condition::Event { event, .. } => f(event),
            Condition::Value(value) => value.visit_refs(f),
        }
        self.outcomes.values_mut().for_each(f);
    }

    fn flatten(&self) -> bool {
        true
    }
}

/// Mark another event cancelled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cancel {
    target: EventId,
    done: bool,
}

impl Cancel {
    #[must_use]
    pub fn new(target: EventId) -> Self {
        Self {
            target,
            done: false,
        }
    }
}

impl Resolve for Cancel {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        state.event_mut(self.target)?.cancel();
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = state
            .event(self.target)
            .map_or("an event", |event| event.kind.name());
        format!("{name} is prevented")
    }
}

/// Adjust a counter on a global effect (doom tokens, rumor progress).
///
/// Counters never drop below zero.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CounterChange {
    slot: GlobalSlot,
    counter: String,
    delta: Value,
    applied: Option<i64>,
}

impl CounterChange {
    #[must_use]
    pub fn new(slot: GlobalSlot, counter: impl Into<String>, delta: impl Into<Value>) -> Self {
        Self {
            slot,
            counter: counter.into(),
            delta: delta.into(),
            applied: None,
        }
    }

    #[must_use]
    pub fn slot(&self) -> GlobalSlot {
        self.slot
    }

    #[must_use]
    pub fn counter(&self) -> &str {
        &self.counter
    }
}

impl Resolve for CounterChange {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let requested = self.delta.value(state)?;
        let global = state
            .global_mut(self.slot)
            .ok_or_else(|| EngineError::MissingContent(self.slot.to_string()))?;
        let before = global.counter(&self.counter).unwrap_or(0);
        let after = (before as f64 + requested).max(0.0).floor() as i64;
        global.set_counter(self.counter.clone(), after);
        self.applied = Some(after - before);
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.applied.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let owner = state
            .global(self.slot)
            .map_or_else(|| self.slot.to_string(), |g| g.name.clone());
        match self.applied {
            Some(delta) => format!("{owner}: {} changes by {delta}", self.counter),
            None => format!("{owner}: {} changes by {}", self.counter, self.delta.describe()),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "delta" => self.applied.map(|d| d as f64),
            _ => None,
        }
    }

    fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        self.delta.visit_refs(f);
    }
}

/// How a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory,
    Defeat,
}

/// End the game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameOver {
    outcome: Outcome,
    done: bool,
}

impl GameOver {
    #[must_use]
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            done: false,
        }
    }
}

impl Resolve for GameOver {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        state.set_stage(match self.outcome {
            Outcome::Victory => GameStage::Victory,
            Outcome::Defeat => GameStage::Defeat,
        });
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, _state: &GameState) -> String {
        match self.outcome {
            Outcome::Victory => "The investigators are victorious".to_string(),
            Outcome::Defeat => "The investigators are defeated".to_string(),
        }
    }
}
