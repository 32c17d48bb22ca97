//! Deterministic dice and shuffling.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Scriptable**: Queued faces are consumed before the generator, so
//!   tests can pin exact rolls
//! - **Serializable**: State is captured as seed + ChaCha8 word position
//!
//! ## Usage
//!
//! ```
//! use eldritch::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//! rng.queue_rolls([5, 1]);
//!
//! assert_eq!(rng.roll_die(), 5);
//! assert_eq!(rng.roll_die(), 1);
//! assert!((1..=6).contains(&rng.roll_die()));
//! ```

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Faces rolled for one dice pool.
pub type Roll = SmallVec<[u8; 8]>;

/// Seedable random source owned by the game state.
///
/// Uses ChaCha8 so a restored checkpoint continues the exact sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "GameRngState", from = "GameRngState")]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    scripted: VecDeque<u8>,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            scripted: VecDeque::new(),
        }
    }

    /// Queue faces to be returned by the next die rolls, in order.
    ///
    /// Faces outside 1..=6 are clamped into range.
    pub fn queue_rolls(&mut self, faces: impl IntoIterator<Item = u8>) {
        self.scripted
            .extend(faces.into_iter().map(|face| face.clamp(1, 6)));
    }

    /// Number of scripted faces not yet consumed.
    #[must_use]
    pub fn scripted_len(&self) -> usize {
        self.scripted.len()
    }

    /// Roll one six-sided die.
    pub fn roll_die(&mut self) -> u8 {
        match self.scripted.pop_front() {
            Some(face) => face,
            None => self.inner.gen_range(1..=6),
        }
    }

    /// Roll `count` dice.
    pub fn roll_dice(&mut self, count: usize) -> Roll {
        (0..count).map(|_| self.roll_die()).collect()
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            scripted: self.scripted.iter().copied().collect(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            scripted: state.scripted.iter().copied().collect(),
        }
    }
}

/// Serializable RNG state for checkpointing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter)
    pub word_pos: u128,
    /// Scripted faces still pending
    pub scripted: Vec<u8>,
}

impl From<GameRng> for GameRngState {
    fn from(rng: GameRng) -> Self {
        rng.state()
    }
}

impl From<GameRngState> for GameRng {
    fn from(state: GameRngState) -> Self {
        GameRng::from_state(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.roll_die(), rng2.roll_die());
        }
    }

    #[test]
    fn test_faces_in_range() {
        let mut rng = GameRng::new(7);
        for face in rng.roll_dice(500) {
            assert!((1..=6).contains(&face));
        }
    }

    #[test]
    fn test_scripted_rolls_come_first() {
        let mut rng = GameRng::new(1);
        rng.queue_rolls([6, 6, 0, 9]);
        assert_eq!(rng.scripted_len(), 4);

        let roll = rng.roll_dice(4);
        assert_eq!(roll.as_slice(), &[6, 6, 1, 6]);
        assert_eq!(rng.scripted_len(), 0);
    }

    #[test]
    fn test_zero_dice() {
        let mut rng = GameRng::new(1);
        assert!(rng.roll_dice(0).is_empty());
    }

    #[test]
    fn test_state_restores_sequence() {
        let mut rng = GameRng::new(42);
        for _ in 0..37 {
            rng.roll_die();
        }
        rng.queue_rolls([3]);

        let state = rng.state();
        let expected: Vec<_> = (0..10).map(|_| rng.roll_die()).collect();

        let mut restored = GameRng::from_state(&state);
        let actual: Vec<_> = (0..10).map(|_| restored.roll_die()).collect();

        assert_eq!(expected, actual);
        assert_eq!(actual[0], 3);
    }

    #[test]
    fn test_serde_round_trip_continues_stream() {
        let mut rng = GameRng::new(9);
        rng.roll_dice(5);

        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();

        assert_eq!(rng.roll_dice(6), restored.roll_dice(6));
    }
}
