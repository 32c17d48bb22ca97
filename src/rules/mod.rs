//! Game flow: stages, the turn and phase state machine, and the structural
//! rules every game plays by regardless of content.

mod structural;
mod turn;

use serde::{Deserialize, Serialize};

pub use structural::StructuralRules;
pub use turn::{TurnPhase, TurnTracker};

/// Where the game as a whole stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStage {
    /// Characters are choosing starting sliders.
    Setup,
    /// The ancient one sleeps. Full turns with five phases.
    Slumber,
    /// The final battle. Upkeep, attacks, and the ancient one's attack.
    Awakened,
    Victory,
    Defeat,
}

impl GameStage {
    #[must_use]
    pub fn is_over(self) -> bool {
        matches!(self, GameStage::Victory | GameStage::Defeat)
    }
}
