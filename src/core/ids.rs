//! Identifiers for everything the engine stores in flat collections.
//!
//! Characters, places, monsters, events and log entries all live in arenas
//! owned by `GameState`. Cross references between them are always one of
//! these ids, never a borrowed pointer, so the whole state serializes as
//! plain data.
//!
//! ## Usage
//!
//! ```
//! use eldritch::core::{CharacterId, PlaceId};
//!
//! let seat = CharacterId::new(2);
//! assert_eq!(seat.index(), 2);
//! assert_eq!(format!("{}", PlaceId::new(7)), "Place(7)");
//! ```

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident($raw:ty), $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $raw);

        impl $name {
            /// Create a new id.
            #[must_use]
            pub const fn new(id: $raw) -> Self {
                Self(id)
            }

            /// Get the raw id value.
            #[must_use]
            pub const fn raw(self) -> $raw {
                self.0
            }

            /// Id for slot `index`, or `None` past the id space.
            #[must_use]
            pub fn from_index(index: usize) -> Option<Self> {
                <$raw>::try_from(index).ok().map(Self)
            }

            /// Position of this id in its owning collection.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

arena_id!(
    /// A seat at the table. Seat order is turn order.
    CharacterId(u8),
    "Character"
);

arena_id!(
    /// A node of the city map or an other-world space.
    PlaceId(u16),
    "Place"
);

arena_id!(
    /// A monster instance, on the board or in the cup.
    MonsterId(u32),
    "Monster"
);

arena_id!(
    /// An event placed in the event arena.
    EventId(u32),
    "Event"
);

arena_id!(
    /// A node of the audit log tree.
    LogId(u32),
    "Log"
);

/// Where a global effect is mounted.
///
/// The derived ordering is the order in which global effects are queried
/// for interrupts, triggers, modifiers and overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GlobalSlot {
    /// The ancient one's own rules (doom track, combat rating).
    AncientOne,
    /// The active environment card.
    Environment,
    /// The active rumor card.
    Rumor,
    /// Any other ongoing headline or effect.
    Other(u16),
}

impl std::fmt::Display for GlobalSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlobalSlot::AncientOne => write!(f, "AncientOne"),
            GlobalSlot::Environment => write!(f, "Environment"),
            GlobalSlot::Rumor => write!(f, "Rumor"),
            GlobalSlot::Other(n) => write!(f, "Global({n})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CharacterId::new(1)), "Character(1)");
        assert_eq!(format!("{}", MonsterId::new(12)), "Monster(12)");
        assert_eq!(format!("{}", EventId::new(0)), "Event(0)");
        assert_eq!(format!("{}", GlobalSlot::Other(3)), "Global(3)");
    }

    #[test]
    fn test_from_index() {
        assert_eq!(CharacterId::from_index(255), Some(CharacterId::new(255)));
        assert_eq!(CharacterId::from_index(256), None);
        assert_eq!(PlaceId::from_index(70_000), None);
    }

    #[test]
    fn test_global_query_order() {
        let mut slots = vec![
            GlobalSlot::Other(0),
            GlobalSlot::Rumor,
            GlobalSlot::AncientOne,
            GlobalSlot::Environment,
        ];
        slots.sort();
        assert_eq!(
            slots,
            vec![
                GlobalSlot::AncientOne,
                GlobalSlot::Environment,
                GlobalSlot::Rumor,
                GlobalSlot::Other(0),
            ]
        );
    }
}
