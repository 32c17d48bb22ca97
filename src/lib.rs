//! # eldritch
//!
//! The event-resolution core of a cooperative horror board game.
//!
//! ## Design Principles
//!
//! 1. **Everything is an event**: every game action is a small resumable
//!    state machine from a closed family. Content composes them; it never
//!    adds variants.
//!
//! 2. **The stacks are the continuation**: the resolution loop keeps no
//!    hidden state. Four parallel stacks plus the event arena describe
//!    exactly where a suspended game stands, so a checkpoint is just the
//!    serialized `GameState`.
//!
//! 3. **Ids, not pointers**: characters, places, monsters and events live
//!    in flat collections owned by `GameState` and refer to each other by
//!    id.
//!
//! ## Modules
//!
//! - `core`: ids, RNG, configuration, errors, the `GameState` root
//! - `values`: lazily evaluated numeric expressions
//! - `entities`: characters, possessions, monsters, places
//! - `decks`: named draw piles
//! - `content`: capability providers, global effects, the content registry
//! - `events`: the event family and its arena
//! - `stack`: the four stacks, the audit log and the resolution loop
//! - `rules`: stages, turn rotation and structural rules
//! - `commands`: player commands and validated dispatch
//! - `view`: per-viewer snapshots
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use eldritch::commands::Command;
//! use eldritch::content::ContentRegistry;
//! use eldritch::core::{CharacterId, GameConfig, GameState};
//! use eldritch::entities::{CharacterTemplate, Place, PlaceKind};
//! use eldritch::stack::Suspension;
//!
//! let mut state = GameState::new(GameConfig::new(3), Arc::new(ContentRegistry::new()));
//! state.add_place(Place::new("Library", PlaceKind::Location)).unwrap();
//! let ada = state.add_character(&CharacterTemplate::new("Ada", "Library")).unwrap();
//!
//! let waiting = state.start().unwrap();
//! assert!(matches!(waiting, Suspension::Sliders { character: Some(c), .. } if c == ada));
//!
//! // Setup sliders are free; finishing them starts turn one.
//! state.handle(ada, Command::DoneSliders).unwrap();
//! assert_eq!(state.turn_number(), 1);
//! ```

pub mod commands;
pub mod content;
pub mod core;
pub mod decks;
pub mod entities;
pub mod events;
pub mod rules;
pub mod stack;
pub mod values;
pub mod view;

// Re-export commonly used types
pub use crate::commands::Command;
pub use crate::content::{ContentRegistry, GlobalEffect, Provider};
pub use crate::core::{
    CharacterId, CommandError, EngineError, EventId, GameConfig, GameError, GameState, MonsterId,
    PlaceId,
};
pub use crate::events::{Event, EventKind};
pub use crate::rules::{GameStage, TurnPhase};
pub use crate::stack::Suspension;
