//! Game configuration.
//!
//! Everything a host decides before the first turn: the RNG seed, whether
//! the engine runs unattended (test mode), and where knocked-out characters
//! recover. Map topology, decks and characters are supplied separately via
//! `GameState` setup methods since they are content, not settings.

use serde::{Deserialize, Serialize};

/// Number of positions on every slider track.
pub const DEFAULT_SLIDER_POSITIONS: u8 = 4;

/// Longest route a single `Move` command may search.
pub const DEFAULT_MAX_ROUTE_LEN: u8 = 8;

/// Host-level settings for one game.
///
/// ```
/// use eldritch::core::GameConfig;
///
/// let config = GameConfig::new(7)
///     .test_mode()
///     .with_hospital("St. Mary's Hospital")
///     .with_asylum("Arkham Asylum");
///
/// assert!(config.test_mode);
/// assert_eq!(config.hospital.as_deref(), Some("St. Mary's Hospital"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seed for dice and shuffles.
    pub seed: u64,

    /// Test mode: dice resolve without a roll request and the resolution
    /// loop idles on an empty stack instead of starting the next turn.
    #[serde(default)]
    pub test_mode: bool,

    /// Positions per slider track.
    #[serde(default = "default_slider_positions")]
    pub slider_positions: u8,

    /// Where a character knocked out by stamina loss wakes up.
    #[serde(default)]
    pub hospital: Option<String>,

    /// Where a character knocked out by sanity loss wakes up.
    #[serde(default)]
    pub asylum: Option<String>,

    /// Cap on route length when pathing a move.
    #[serde(default = "default_max_route_len")]
    pub max_route_len: u8,
}

fn default_slider_positions() -> u8 {
    DEFAULT_SLIDER_POSITIONS
}

fn default_max_route_len() -> u8 {
    DEFAULT_MAX_ROUTE_LEN
}

impl GameConfig {
    /// Create a configuration with the given seed and default settings.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            test_mode: false,
            slider_positions: DEFAULT_SLIDER_POSITIONS,
            hospital: None,
            asylum: None,
            max_route_len: DEFAULT_MAX_ROUTE_LEN,
        }
    }

    /// Run in test mode.
    #[must_use]
    pub fn test_mode(mut self) -> Self {
        self.test_mode = true;
        self
    }

    /// Set the number of positions per slider track.
    #[must_use]
    pub fn with_slider_positions(mut self, positions: u8) -> Self {
        self.slider_positions = positions.max(1);
        self
    }

    /// Set the longest route a move may take.
    #[must_use]
    pub fn with_max_route_len(mut self, hops: u8) -> Self {
        self.max_route_len = hops.max(1);
        self
    }

    /// Set the stamina recovery place by name.
    #[must_use]
    pub fn with_hospital(mut self, place: impl Into<String>) -> Self {
        self.hospital = Some(place.into());
        self
    }

    /// Set the sanity recovery place by name.
    #[must_use]
    pub fn with_asylum(mut self, place: impl Into<String>) -> Self {
        self.asylum = Some(place.into());
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
