//! Capability providers and the content they come from.
//!
//! Possessions, monsters and global effects carry only serializable data
//! (a name, flags, counters). What they *do* is a [`Provider`] registered
//! under that name in a [`ContentRegistry`]. The scheduler queries providers
//! for interrupts and triggers; checks query them for modifiers and
//! overrides.

mod global;
mod provider;
mod query;
mod registry;

pub use global::GlobalEffect;
pub use provider::{Hook, Owner, Provider, Subject};
pub use registry::{ContentRegistry, EventFactory};
