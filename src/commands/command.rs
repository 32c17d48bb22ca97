//! Player command representation.

use serde::{Deserialize, Serialize};

use crate::core::PlaceId;
use crate::entities::SliderPair;
use crate::events::Resource;

/// Everything a player can send.
///
/// A command answers whatever the loop is currently suspended on. Sending
/// one that answers nothing is an `InvalidMove`; answering somebody else's
/// decision is `NotYourTurn`.
///
/// ```
/// use eldritch::commands::Command;
/// use eldritch::events::Resource;
///
/// let spend = Command::Spend(Resource::Clues);
/// assert_eq!(spend.name(), "spend");
/// assert_eq!(Command::Choose("Fight".into()).name(), "choose");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Pick an option of a choice, or a card to keep.
    Choose(String),
    /// Put one unit of a resource towards a choice's cost.
    Spend(Resource),
    /// Take one spent unit back.
    Unspend(Resource),
    /// Press the roll button of a pending dice roll.
    Roll,
    SetSlider { pair: SliderPair, position: u8 },
    DoneSliders,
    /// Move towards a place during the movement phase.
    Move(PlaceId),
    EndMovement,
    /// Use the n-th optional response currently on offer to this character.
    Use(usize),
    /// Pass on every optional response in the current window.
    DoneUsing,
    /// Fill a devoured seat with an available character.
    ChooseCharacter(String),
}

impl Command {
    /// Short name, for tracing.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Choose(_) => "choose",
            Command::Spend(_) => "spend",
            Command::Unspend(_) => "unspend",
            Command::Roll => "roll",
            Command::SetSlider { .. } => "set_slider",
            Command::DoneSliders => "done_sliders",
            Command::Move(_) => "move",
            Command::EndMovement => "end_movement",
            Command::Use(_) => "use",
            Command::DoneUsing => "done_using",
            Command::ChooseCharacter(_) => "choose_character",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let command = Command::SetSlider {
            pair: SliderPair::LoreLuck,
            position: 2,
        };
        let json = serde_json::to_string(&command).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, command);
        assert_eq!(
            serde_json::to_string(&Command::Move(PlaceId::new(3))).unwrap(),
            r#"{"Move":3}"#
        );
    }
}
