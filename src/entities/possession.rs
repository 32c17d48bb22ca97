//! Possessions: items, spells, skills, allies and special abilities.
//!
//! A `Possession` is plain instance data. Its behaviour (interrupts,
//! triggers, modifiers) lives in the content registry under the
//! possession's name, so the state stays serializable.
//!
//! ## Instance State
//!
//! `state` is a small `FxHashMap<String, i64>` for per-copy counters such as
//! charges or tokens. Booleans are stored as 0/1.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Which deck a possession came from (and returns to).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PossessionKind {
    Common,
    Unique,
    Spell,
    Skill,
    Ally,
    /// Printed character ability. Never discarded.
    Ability,
}

/// A possession held by a character.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Possession {
    pub name: String,
    pub kind: PossessionKind,
    /// Spent for this turn. Cleared in upkeep.
    pub exhausted: bool,
    #[serde(default)]
    pub state: FxHashMap<String, i64>,
}

impl Possession {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PossessionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            exhausted: false,
            state: FxHashMap::default(),
        }
    }

    /// Read a counter, defaulting to 0.
    #[must_use]
    pub fn get(&self, key: &str) -> i64 {
        self.state.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: impl Into<String>, value: i64) {
        self.state.insert(key.into(), value);
    }
}
