//! Draw piles.

mod piles;

pub use piles::{DeckId, DeckPosition, Decks};
