//! Things that live on the board: characters, their possessions, monsters
//! and places.

mod character;
mod monster;
mod place;
mod possession;

pub use character::{
    CheckType, Character, CharacterTemplate, SliderBase, SliderPair, Stat, Trophy,
};
pub use monster::{Monster, MonsterLocation, MovementType, Rating};
pub use place::{Gate, Place, PlaceKind};
pub use possession::{Possession, PossessionKind};
