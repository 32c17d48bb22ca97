//! The event stack and the resolution loop.
//!
//! Frames resolve depth-first. For each frame the loop:
//!
//! 1. opens it: creates its log entry and asks every provider for
//!    interrupts,
//! 2. pushes its interrupts one at a time,
//! 3. waits for input or optional responses if it needs them,
//! 4. calls `resolve` until the event finishes (each unfinished call pushes
//!    exactly one child frame),
//! 5. asks every provider for triggers and pushes them one at a time,
//! 6. waits for optional post-hoc responses, then pops.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use eldritch::content::ContentRegistry;
//! use eldritch::core::{GameConfig, GameState};
//! use eldritch::events::{Nothing, Sequence};
//! use eldritch::stack::Suspension;
//!
//! let mut state = GameState::new(GameConfig::new(1).test_mode(), Arc::new(ContentRegistry::new()));
//! let root = state.push_event(Sequence::new(None, vec![Nothing::new().into(), Nothing::new().into()]));
//!
//! assert_eq!(state.resolve_loop().unwrap(), Suspension::Idle);
//! assert!(state.event(root).unwrap().is_resolved());
//! assert!(state.stack().is_empty());
//! ```

mod frames;
mod log;
mod scheduler;

pub use frames::{EventStack, Timing, Usable, UsableWindow};
pub use log::{EventLog, LogEntry, LogLine};
pub use scheduler::Suspension;
