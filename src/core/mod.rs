//! Core engine types: ids, RNG, configuration, errors and the state root.
//!
//! Everything else in the crate hangs off [`GameState`]. Content and rules
//! reach entities through the ids defined here.

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod state;

pub use config::{GameConfig, DEFAULT_MAX_ROUTE_LEN, DEFAULT_SLIDER_POSITIONS};
pub use error::{CommandError, EngineError, GameError};
pub use ids::{CharacterId, EventId, GlobalSlot, LogId, MonsterId, PlaceId};
pub use rng::{GameRng, GameRngState, Roll};
pub use state::GameState;
