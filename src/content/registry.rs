//! Content registry: behaviours and event factories by name.
//!
//! The registry is code, not data. It is shared behind an `Arc`, skipped by
//! serialization, and reattached when a checkpoint is restored.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::provider::Provider;
use crate::core::{CharacterId, EngineError, GameState};
use crate::events::Event;

/// Builds the event tree for an encounter, gate card, mythos card or
/// ancient one attack. Gets the character involved, if any.
pub type EventFactory =
    Arc<dyn Fn(Option<CharacterId>, &GameState) -> Result<Event, EngineError> + Send + Sync>;

/// Registry of content behaviour.
///
/// ## Example
///
/// ```
/// use eldritch::content::ContentRegistry;
/// use eldritch::events::{GainOrLoss, Nothing, Resource};
///
/// let registry = ContentRegistry::new()
///     .with_encounter("Library", |character, _state| {
///         Ok(match character {
///             Some(c) => GainOrLoss::gain(c, Resource::Clues, 1).into(),
///             None => Nothing::new().into(),
///         })
///     });
///
/// assert!(registry.encounter("Library").is_some());
/// assert!(registry.encounter("Bank").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ContentRegistry {
    behaviours: FxHashMap<String, Arc<dyn Provider>>,
    encounters: FxHashMap<String, EventFactory>,
    gate_encounters: FxHashMap<String, EventFactory>,
    mythos: FxHashMap<String, EventFactory>,
    ancient_attacks: FxHashMap<String, EventFactory>,
}

fn factory<F>(f: F) -> EventFactory
where
    F: Fn(Option<CharacterId>, &GameState) -> Result<Event, EngineError> + Send + Sync + 'static,
{
    Arc::new(f)
}

impl ContentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the behaviour of a possession, monster or global effect.
    pub fn register(&mut self, name: impl Into<String>, behaviour: impl Provider + 'static) {
        self.behaviours.insert(name.into(), Arc::new(behaviour));
    }

    #[must_use]
    pub fn with_behaviour(mut self, name: impl Into<String>, behaviour: impl Provider + 'static) -> Self {
        self.register(name, behaviour);
        self
    }

    /// Encounter for a location, by place name.
    #[must_use]
    pub fn with_encounter<F>(mut self, place: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<CharacterId>, &GameState) -> Result<Event, EngineError> + Send + Sync + 'static,
    {
        self.encounters.insert(place.into(), factory(f));
        self
    }

    /// Other-world encounter, by gate card name.
    #[must_use]
    pub fn with_gate_encounter<F>(mut self, card: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<CharacterId>, &GameState) -> Result<Event, EngineError> + Send + Sync + 'static,
    {
        self.gate_encounters.insert(card.into(), factory(f));
        self
    }

    /// Mythos card effect, by card name.
    #[must_use]
    pub fn with_mythos<F>(mut self, card: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<CharacterId>, &GameState) -> Result<Event, EngineError> + Send + Sync + 'static,
    {
        self.mythos.insert(card.into(), factory(f));
        self
    }

    /// Attack of an awakened ancient one, by its name.
    #[must_use]
    pub fn with_ancient_attack<F>(mut self, ancient_one: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<CharacterId>, &GameState) -> Result<Event, EngineError> + Send + Sync + 'static,
    {
        self.ancient_attacks.insert(ancient_one.into(), factory(f));
        self
    }

    #[must_use]
    pub fn behaviour(&self, name: &str) -> Option<&dyn Provider> {
        self.behaviours.get(name).map(|b| b.as_ref())
    }

    #[must_use]
    pub fn encounter(&self, place: &str) -> Option<&EventFactory> {
        self.encounters.get(place)
    }

    #[must_use]
    pub fn gate_encounter(&self, card: &str) -> Option<&EventFactory> {
        self.gate_encounters.get(card)
    }

    #[must_use]
    pub fn mythos(&self, card: &str) -> Option<&EventFactory> {
        self.mythos.get(card)
    }

    #[must_use]
    pub fn ancient_attack(&self, ancient_one: &str) -> Option<&EventFactory> {
        self.ancient_attacks.get(ancient_one)
    }
}

impl fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.behaviours.keys().collect();
        names.sort();
        f.debug_struct("ContentRegistry")
            .field("behaviours", &names)
            .field("encounters", &self.encounters.len())
            .field("gate_encounters", &self.gate_encounters.len())
            .field("mythos", &self.mythos.len())
            .field("ancient_attacks", &self.ancient_attacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Nothing;

    struct Inert;

    impl Provider for Inert {}

    #[test]
    fn test_lookup() {
        let registry = ContentRegistry::new()
            .with_behaviour("Lucky Cigarette Case", Inert)
            .with_mythos("Blackest Night", |_, _| Ok(Nothing::new().into()));

        assert!(registry.behaviour("Lucky Cigarette Case").is_some());
        assert!(registry.behaviour("Tommy Gun").is_none());
        assert!(registry.mythos("Blackest Night").is_some());
        assert!(format!("{registry:?}").contains("Lucky Cigarette Case"));
    }
}
