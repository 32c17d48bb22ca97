//! Monsters.
//!
//! A monster is an immutable combat template plus a mutable location. A
//! rating of `None` means the check does not apply at all, which is not the
//! same as a rating of 0: a monster with no horror rating skips the horror
//! check, while one rated 0 still forces a check at +0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{CharacterId, PlaceId};

/// How a monster moves during mythos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    Normal,
    Fast,
    Stationary,
    Flying,
    Unique,
}

/// Difficulty modifier and damage for one check type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub difficulty: i32,
    pub damage: i32,
}

impl Rating {
    #[must_use]
    pub const fn new(difficulty: i32, damage: i32) -> Self {
        Self { difficulty, damage }
    }
}

/// Where a monster is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterLocation {
    /// Not on the board.
    Cup,
    At(PlaceId),
    Trophy(CharacterId),
}

/// A monster instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub movement: MovementType,
    pub dimension: String,
    pub awareness: Option<i32>,
    pub horror: Option<Rating>,
    pub combat: Option<Rating>,
    pub toughness: i32,
    /// Keywords such as "endless", "ambush", "physical_immunity".
    pub attributes: BTreeSet<String>,
    pub location: MonsterLocation,
}

impl Monster {
    #[must_use]
    pub fn new(name: impl Into<String>, dimension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            movement: MovementType::Normal,
            dimension: dimension.into(),
            awareness: Some(0),
            horror: Some(Rating::new(0, 1)),
            combat: Some(Rating::new(0, 1)),
            toughness: 1,
            attributes: BTreeSet::new(),
            location: MonsterLocation::Cup,
        }
    }

    #[must_use]
    pub fn with_movement(mut self, movement: MovementType) -> Self {
        self.movement = movement;
        self
    }

    #[must_use]
    pub fn with_awareness(mut self, awareness: Option<i32>) -> Self {
        self.awareness = awareness;
        self
    }

    #[must_use]
    pub fn with_horror(mut self, horror: Option<Rating>) -> Self {
        self.horror = horror;
        self
    }

    #[must_use]
    pub fn with_combat(mut self, combat: Option<Rating>) -> Self {
        self.combat = combat;
        self
    }

    #[must_use]
    pub fn with_toughness(mut self, toughness: i32) -> Self {
        self.toughness = toughness;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into());
        self
    }

    #[must_use]
    pub fn has(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    #[must_use]
    pub fn place(&self) -> Option<PlaceId> {
        match self.location {
            MonsterLocation::At(place) => Some(place),
            _ => None,
        }
    }

    /// Printed attribute by name. Inapplicable ratings read as missing.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<f64> {
        let value = match name {
            "toughness" => self.toughness,
            "awareness" => self.awareness?,
            "horror_difficulty" => self.horror?.difficulty,
            "horror_damage" => self.horror?.damage,
            "combat_difficulty" => self.combat?.difficulty,
            "combat_damage" => self.combat?.damage,
            keyword => i32::from(self.has(keyword)),
        };
        Some(f64::from(value))
    }
}
