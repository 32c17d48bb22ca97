//! Error types.
//!
//! Three classes of failure exist:
//!
//! - Domain no-ops (drawing from an empty deck, a failed prerequisite) are
//!   not errors at all. They resolve normally and say so in the log.
//! - [`EngineError`] is a broken scheduler contract. Content produced an
//!   event graph the engine cannot continue from. Fatal.
//! - [`CommandError`] is a player command that does not match any pending
//!   decision. The state is untouched and the caller may retry.

use thiserror::Error;

use super::ids::{CharacterId, EventId};

/// Scheduler-contract violation. There is no safe continuation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{event} was resolved again after it finished")]
    ResolvedTwice { event: EventId },

    #[error("{event} neither finished nor pushed exactly one frame (pushed {pushed})")]
    BrokenContract { event: EventId, pushed: usize },

    #[error(
        "stack lengths diverged: events={events} interrupts={interrupts} triggers={triggers} logs={logs}"
    )]
    StackMismatch {
        events: usize,
        interrupts: usize,
        triggers: usize,
        logs: usize,
    },

    #[error("conditional has no outcome at or below {observed}")]
    NoThreshold { observed: f64 },

    #[error("conditional needs an outcome keyed at or below 0, lowest is {lowest:?}")]
    MissingCatchAll { lowest: Option<i64> },

    #[error("`{attribute}` is not available on {target}")]
    MissingAttribute { target: String, attribute: String },

    #[error("child event was used before being placed in the arena")]
    UnplacedChild,

    #[error("no {kind} with id {id}")]
    UnknownId { kind: &'static str, id: u32 },

    #[error("no room for another {kind}")]
    Full { kind: &'static str },

    #[error("nothing registered under `{0}`")]
    MissingContent(String),

    #[error("checkpoint failed: {0}")]
    Checkpoint(String),
}

impl EngineError {
    pub(crate) fn missing(target: impl std::fmt::Display, attribute: &str) -> Self {
        EngineError::MissingAttribute {
            target: target.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

/// A player command that was refused. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("it is not {0}'s decision")]
    NotYourTurn(CharacterId),

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("no character in seat {0}")]
    UnknownCharacter(CharacterId),

    #[error("the game is over")]
    GameOver,
}

impl CommandError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CommandError::InvalidMove(reason.into())
    }
}

/// Result of `GameState::handle`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error(transparent)]
    Rejected(#[from] CommandError),

    #[error(transparent)]
    Fatal(#[from] EngineError),
}
