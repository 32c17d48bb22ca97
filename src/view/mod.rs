//! Serializable views for a presentation layer.

mod snapshot;

pub use snapshot::{
    CharacterView, DiceView, OptionView, PendingView, PossessionView, Snapshot,
};
