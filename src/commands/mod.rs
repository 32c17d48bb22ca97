//! Player commands and their validated dispatch.
//!
//! The host sends one [`Command`] per player action to
//! [`GameState::handle`](crate::core::GameState::handle), which either
//! rejects it untouched or applies it and resumes the resolution loop.

mod command;
mod handler;

pub use command::Command;
