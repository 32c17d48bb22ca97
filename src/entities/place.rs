//! Map nodes.
//!
//! Places do not own monsters or characters. Occupancy is a query over the
//! state's flat collections.

use serde::{Deserialize, Serialize};

use crate::core::PlaceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceKind {
    Street,
    Location,
    OtherWorld,
}

/// An open gate and the other world it leads to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub name: String,
    pub world: PlaceId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub kind: PlaceKind,
    pub neighbors: Vec<PlaceId>,
    pub clues: u32,
    pub gate: Option<Gate>,
    pub sealed: bool,
}

impl Place {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PlaceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            neighbors: Vec::new(),
            clues: 0,
            gate: None,
            sealed: false,
        }
    }

    #[must_use]
    pub fn with_clues(mut self, clues: u32) -> Self {
        self.clues = clues;
        self
    }

    #[must_use]
    pub fn is_adjacent(&self, other: PlaceId) -> bool {
        self.neighbors.contains(&other)
    }
}
