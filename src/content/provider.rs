//! The capability provider contract.

use serde::{Deserialize, Serialize};

use crate::core::{CharacterId, EventId, GameState, GlobalSlot, MonsterId};
use crate::events::Event;

/// Who answers a query: the structural rules, a global effect, one of a
/// character's possessions, or a monster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Rules,
    Global(GlobalSlot),
    Possession { character: CharacterId, slot: usize },
    Monster(MonsterId),
}

impl Owner {
    /// The character holding this owner, for possessions.
    #[must_use]
    pub fn character(self) -> Option<CharacterId> {
        match self {
            Owner::Possession { character, .. } => Some(character),
            _ => None,
        }
    }
}

/// What a modifier or override is asked about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Character(CharacterId),
    Monster(MonsterId),
}

/// Everything a provider sees when asked about an event.
///
/// The state is borrowed immutably: a provider changes the game only through
/// the events it returns.
#[derive(Clone, Copy)]
pub struct Hook<'a> {
    pub event_id: EventId,
    pub event: &'a Event,
    pub owner: Owner,
    pub state: &'a GameState,
}

impl Hook<'_> {
    /// The event happens to the character owning this provider.
    #[must_use]
    pub fn is_own(&self) -> bool {
        self.owner.character().is_some() && self.owner.character() == self.event.character()
    }
}

/// Behaviour of a possession, monster, global effect or the structural
/// rules.
///
/// Every method is optional. `None` means no opinion.
///
/// ```
/// use eldritch::content::{Hook, Provider};
/// use eldritch::events::{Event, GainOrLoss, Resource};
///
/// /// Heals its holder by one stamina after every check they make.
/// struct Salve;
///
/// impl Provider for Salve {
///     fn trigger(&self, hook: &Hook<'_>) -> Option<Event> {
///         let character = hook.owner.character()?;
///         (hook.is_own() && hook.event.kind.name() == "Check")
///             .then(|| GainOrLoss::gain(character, Resource::Stamina, 1).into())
///     }
/// }
/// ```
pub trait Provider: Send + Sync {
    /// Forced reaction before the event resolves.
    fn interrupt(&self, _hook: &Hook<'_>) -> Option<Event> {
        None
    }

    /// Optional reaction before the event resolves, offered to the owner.
    fn usable_interrupt(&self, _hook: &Hook<'_>) -> Option<Event> {
        None
    }

    /// Forced reaction after the event resolved.
    fn trigger(&self, _hook: &Hook<'_>) -> Option<Event> {
        None
    }

    /// Optional reaction after the event resolved, offered to the owner.
    fn usable_trigger(&self, _hook: &Hook<'_>) -> Option<Event> {
        None
    }

    /// Added to `attribute` of `subject`. Summed over every provider.
    fn modifier(&self, _owner: Owner, _subject: Subject, _attribute: &str, _state: &GameState) -> i32 {
        0
    }

    fn override_for(
        &self,
        _owner: Owner,
        _subject: Subject,
        _attribute: &str,
        _state: &GameState,
    ) -> Option<bool> {
        None
    }
}
