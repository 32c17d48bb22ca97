//! The event family.
//!
//! An [`Event`] is one atomic game action. Every variant is a small state
//! machine implementing the internal `Resolve` contract:
//!
//! - `resolve(state)` performs one step. It returns `true` once the event
//!   is finished, or pushes exactly one sub-event and returns `false`.
//! - `is_resolved()` is a pure predicate that stays true once it turns true.
//!   A cancelled event also counts as resolved.
//! - `log(state)` renders the event for the audit trail.
//!
//! The set of variants is closed ([`EventKind`]). Content never subclasses
//! anything: it composes these primitives.
//!
//! ## Families
//!
//! - `flow`: Nothing, Sequence, Conditional, Cancel, CounterChange, GameOver
//! - `dice`: DiceRoll, Check, AttributePrerequisite
//! - `resources`: GainOrLoss, StatusChange, KnockedOut, Devoured
//! - `movement`: Movement, ForceMovement, CityMovement
//! - `cards`: Draw, KeepDrawn, DrawSpecific, MonsterSpawn, ReturnToCup
//! - `choice`: MultipleChoice, SliderInput
//! - `combat`: EvadeOrFightAll, Combat, EvadeRound, CombatRound
//! - `phases`: the root event of every turn phase

mod arena;
mod cards;
mod choice;
mod combat;
mod dice;
mod flow;
mod movement;
mod phases;
mod resources;

use serde::{Deserialize, Serialize};

pub use arena::{EventArena, EventRef};
pub use cards::{Draw, DrawSpecific, KeepDrawn, MonsterSpawn, ReturnToCup};
pub use choice::{ChoiceOption, MultipleChoice, SliderInput};
pub use combat::{Combat, CombatOutcome, CombatRound, EvadeOrFightAll, EvadeRound};
pub use dice::{AttributePrerequisite, Check, DiceRoll};
pub use flow::{Cancel, Condition, Conditional, CounterChange, GameOver, Nothing, Outcome, Sequence};
pub use movement::{CityMovement, ForceMovement, Movement};
pub use phases::{
    AncientAttack, Awaken, EncounterPhase, InvestigatorAttack, MovementPhase, Mythos,
    OtherworldPhase, Upkeep,
};
pub use resources::{Devoured, GainOrLoss, KnockedOut, Resource, Status, StatusChange};

use crate::core::{CharacterId, EngineError, EventId, GameState, MonsterId};

/// Human input an event is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputRequest {
    Choice,
    DiceRoll,
    Sliders,
}

/// Per-variant behaviour. See the module docs for the contract.
pub(crate) trait Resolve {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError>;

    fn is_resolved(&self) -> bool;

    fn log(&self, state: &GameState) -> String;

    /// Outcome fields readable through `Value`s. `None` until they exist.
    fn attribute(&self, _name: &str) -> Option<f64> {
        None
    }

    fn character(&self) -> Option<CharacterId> {
        None
    }

    fn monster(&self) -> Option<MonsterId> {
        None
    }

    fn visit_refs(&mut self, _f: &mut dyn FnMut(&mut EventRef)) {}

    /// Log children at this event's level instead of nesting under it.
    fn flatten(&self) -> bool {
        false
    }

    fn input(&self) -> Option<InputRequest> {
        None
    }
}

macro_rules! event_kinds {
    ($($variant:ident),* $(,)?) => {
        /// Every event variant.
        #[derive(Clone, Debug, Serialize, Deserialize)]
        pub enum EventKind {
            $($variant($variant),)*
        }

        impl EventKind {
            fn inner(&self) -> &dyn Resolve {
                match self {
                    $(EventKind::$variant(e) => e,)*
                }
            }

            fn inner_mut(&mut self) -> &mut dyn Resolve {
                match self {
                    $(EventKind::$variant(e) => e,)*
                }
            }

            /// Variant name, for tracing.
            #[must_use]
            pub fn name(&self) -> &'static str {
                match self {
                    $(EventKind::$variant(_) => stringify!($variant),)*
                }
            }
        }

        $(
            impl From<$variant> for Event {
                fn from(e: $variant) -> Self {
                    Event::new(EventKind::$variant(e))
                }
            }

            impl From<$variant> for EventRef {
                fn from(e: $variant) -> Self {
                    EventRef::from(Event::from(e))
                }
            }
        )*
    };
}

event_kinds!(
    Nothing,
    Sequence,
    Conditional,
    Cancel,
    CounterChange,
    GameOver,
    DiceRoll,
    Check,
    AttributePrerequisite,
    GainOrLoss,
    StatusChange,
    KnockedOut,
    Devoured,
    Movement,
    ForceMovement,
    CityMovement,
    Draw,
    KeepDrawn,
    DrawSpecific,
    MonsterSpawn,
    ReturnToCup,
    MultipleChoice,
    SliderInput,
    EvadeOrFightAll,
    Combat,
    EvadeRound,
    CombatRound,
    Upkeep,
    MovementPhase,
    EncounterPhase,
    OtherworldPhase,
    Mythos,
    Awaken,
    InvestigatorAttack,
    AncientAttack,
);

/// An event plus the bookkeeping every variant shares.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    cancelled: bool,
    resolve_calls: u32,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            cancelled: false,
            resolve_calls: 0,
        }
    }

    /// Perform one resolution step.
    ///
    /// Calling this on a resolved event is a contract violation.
    pub fn resolve(&mut self, id: EventId, state: &mut GameState) -> Result<bool, EngineError> {
        if self.is_resolved() {
            return Err(EngineError::ResolvedTwice { event: id });
        }
        self.resolve_calls += 1;
        self.kind.inner_mut().resolve(state)
    }

    /// Finished or cancelled.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cancelled || self.kind.inner().is_resolved()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// How many times `resolve` has been called.
    #[must_use]
    pub fn resolve_calls(&self) -> u32 {
        self.resolve_calls
    }

    #[must_use]
    pub fn log(&self, state: &GameState) -> String {
        let text = self.kind.inner().log(state);
        if self.cancelled {
            format!("{text} (cancelled)")
        } else {
            text
        }
    }

    /// Read an outcome field.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "cancelled" => Some(f64::from(u8::from(self.cancelled))),
            _ => self.kind.inner().attribute(name),
        }
    }

    /// The character this event happens to, if any.
    #[must_use]
    pub fn character(&self) -> Option<CharacterId> {
        self.kind.inner().character()
    }

    /// The monster involved, if any.
    #[must_use]
    pub fn monster(&self) -> Option<MonsterId> {
        self.kind.inner().monster()
    }

    #[must_use]
    pub fn flatten(&self) -> bool {
        self.kind.inner().flatten()
    }

    /// Human input this event is blocked on.
    #[must_use]
    pub fn input(&self) -> Option<InputRequest> {
        if self.is_resolved() {
            return None;
        }
        self.kind.inner().input()
    }

    /// Faces of a dice roll event.
    #[must_use]
    pub fn rolls(&self) -> Option<&[u8]> {
        match &self.kind {
            EventKind::DiceRoll(roll) => roll.rolls(),
            _ => None,
        }
    }

    /// Ids of placed children, in declaration order.
    #[must_use]
    pub fn children(&self) -> Vec<EventId> {
        let mut copy = self.kind.clone();
        let mut ids = Vec::new();
        copy.inner_mut().visit_refs(&mut |child| {
            if let EventRef::Placed(id) = child {
                ids.push(*id);
            }
        });
        ids
    }

    pub(crate) fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        self.kind.inner_mut().visit_refs(f);
    }
}

/// Push `child` unless it already finished. Returns whether it was pushed.
pub(crate) fn push_unresolved(state: &mut GameState, child: EventId) -> Result<bool, EngineError> {
    if state.event(child)?.is_resolved() {
        return Ok(false);
    }
    state.push_existing(child);
    Ok(true)
}

/// Name used in log lines.
pub(crate) fn who(state: &GameState, character: Option<CharacterId>) -> String {
    character
        .and_then(|id| state.character(id).ok())
        .map_or_else(|| "Nobody".to_string(), |c| c.name.clone())
}
