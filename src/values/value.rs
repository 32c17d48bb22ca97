//! Lazy scalar expressions.
//!
//! A [`Value`] is a small expression tree evaluated against the live game
//! state every time it is read. Nothing is cached between reads, so a value
//! built when a card is drawn reflects the state at the moment an event
//! finally consumes it.
//!
//! Reading an attribute that does not exist yet (a check that has not rolled,
//! a dice roll still pending) is an error rather than a default. That turns
//! out-of-order evaluation into a loud failure.
//!
//! ## Usage
//!
//! ```
//! use eldritch::core::CharacterId;
//! use eldritch::values::{Target, Value};
//!
//! let luck = Value::attr(Target::Character(CharacterId::new(0)), "luck");
//! let pool = luck - Value::from(1);
//! let halved = pool.floor_div(2);
//! # let _ = halved;
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{CharacterId, EngineError, EventId, GameState, GlobalSlot, MonsterId, PlaceId};
use crate::events::EventRef;

/// What an attribute read looks at.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Target {
    Character(CharacterId),
    Monster(MonsterId),
    Place(PlaceId),
    /// Another event, usually a sibling whose outcome this value depends on.
    Event(EventRef),
    /// A named counter on a global effect.
    Global(GlobalSlot),
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Min,
    Max,
}

impl Operator {
    fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => left / right,
            Operator::FloorDiv => (left / right).floor(),
            Operator::Min => left.min(right),
            Operator::Max => left.max(right),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::FloorDiv => "//",
            Operator::Min => "min",
            Operator::Max => "max",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Abs,
    Floor,
}

/// Fixed comparison set for prerequisites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    AtLeast,
    LessThan,
    Exactly,
}

impl Comparison {
    /// Compare `observed` against `threshold`.
    #[must_use]
    pub fn holds(self, observed: f64, threshold: f64) -> bool {
        match self {
            Comparison::AtLeast => observed >= threshold,
            Comparison::LessThan => observed < threshold,
            Comparison::Exactly => observed == threshold,
        }
    }

    pub(crate) fn phrase(self) -> &'static str {
        match self {
            Comparison::AtLeast => "at least",
            Comparison::LessThan => "less than",
            Comparison::Exactly => "exactly",
        }
    }
}

/// A deferred scalar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Const(f64),
    Attr {
        target: Target,
        attribute: String,
    },
    Binary {
        left: Box<Value>,
        op: Operator,
        right: Box<Value>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Value>,
    },
    /// Sum of the faces of a dice roll event.
    DieSum(EventRef),
    /// 1.0 when the comparison holds, else 0.0.
    Prerequisite {
        value: Box<Value>,
        op: Comparison,
        threshold: f64,
    },
}

impl Value {
    /// Read `attribute` from `target`.
    #[must_use]
    pub fn attr(target: Target, attribute: impl Into<String>) -> Self {
        Value::Attr {
            target,
            attribute: attribute.into(),
        }
    }

    /// Unbounded, for full heals and total losses.
    #[must_use]
    pub fn infinite() -> Self {
        Value::Const(f64::INFINITY)
    }

    /// Sum of the faces of a dice roll.
    #[must_use]
    pub fn die_sum(roll: impl Into<EventRef>) -> Self {
        Value::DieSum(roll.into())
    }

    #[must_use]
    pub fn binary(self, op: Operator, right: impl Into<Value>) -> Self {
        Value::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    #[must_use]
    pub fn floor_div(self, right: impl Into<Value>) -> Self {
        self.binary(Operator::FloorDiv, right)
    }

    #[must_use]
    pub fn min(self, right: impl Into<Value>) -> Self {
        self.binary(Operator::Min, right)
    }

    #[must_use]
    pub fn max(self, right: impl Into<Value>) -> Self {
        self.binary(Operator::Max, right)
    }

    #[must_use]
    pub fn unary(self, op: UnaryOp) -> Self {
        Value::Unary {
            op,
            operand: Box::new(self),
        }
    }

    /// Boolean-as-number comparison against a fixed threshold.
    #[must_use]
    pub fn prerequisite(self, op: Comparison, threshold: f64) -> Self {
        Value::Prerequisite {
            value: Box::new(self),
            op,
            threshold,
        }
    }

    /// Evaluate against the current state.
    pub fn value(&self, state: &GameState) -> Result<f64, EngineError> {
        match self {
            Value::Const(v) => Ok(*v),
            Value::Attr { target, attribute } => read_attribute(state, target, attribute),
            Value::Binary { left, op, right } => {
                Ok(op.apply(left.value(state)?, right.value(state)?))
            }
            Value::Unary { op, operand } => {
                let v = operand.value(state)?;
                Ok(match op {
                    UnaryOp::Neg => -v,
                    UnaryOp::Abs => v.abs(),
                    UnaryOp::Floor => v.floor(),
                })
            }
            Value::DieSum(roll) => {
                let id = roll.id()?;
                let event = state.event(id)?;
                // A prevented roll shows no faces.
                if event.is_cancelled() {
                    return Ok(0.0);
                }
                event
                    .attribute("sum")
                    .ok_or_else(|| EngineError::missing(id, "sum"))
            }
            Value::Prerequisite {
                value,
                op,
                threshold,
            } => {
                let observed = value.value(state)?;
                Ok(if op.holds(observed, *threshold) { 1.0 } else { 0.0 })
            }
        }
    }

    /// First dice roll this value depends on that has not resolved yet.
    pub(crate) fn pending_roll(&self, state: &GameState) -> Result<Option<EventId>, EngineError> {
        match self {
            Value::DieSum(roll) => {
                let id = roll.id()?;
                Ok((!state.event(id)?.is_resolved()).then_some(id))
            }
            Value::Binary { left, right, .. } => match left.pending_roll(state)? {
                Some(id) => Ok(Some(id)),
                None => right.pending_roll(state),
            },
            Value::Unary { operand, .. } => operand.pending_roll(state),
            Value::Prerequisite { value, .. } => value.pending_roll(state),
            Value::Const(_) | Value::Attr { .. } => Ok(None),
        }
    }

    /// Visit every event reference held anywhere in the tree.
    pub(crate) fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        match self {
            Value::Attr {
                target: Target::Event(event),
                ..
            } => f(event),
            Value::DieSum(event) => f(event),
            Value::Binary { left, right, .. } => {
                left.visit_refs(f);
                right.visit_refs(f);
            }
            Value::Unary { operand, .. } => operand.visit_refs(f),
            Value::Prerequisite { value, .. } => value.visit_refs(f),
            Value::Const(_) | Value::Attr { .. } => {}
        }
    }

    /// Short human-readable rendering for log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Value::Const(v) if v.is_infinite() => "all".to_string(),
            Value::Const(v) => format!("{v}"),
            Value::Attr { attribute, .. } => attribute.clone(),
            Value::Binary { left, op, right } => match op {
                Operator::Min | Operator::Max => {
                    format!("{}({}, {})", op.symbol(), left.describe(), right.describe())
                }
                _ => format!("({} {} {})", left.describe(), op.symbol(), right.describe()),
            },
            Value::Unary { op, operand } => format!("{op:?}({})", operand.describe()),
            Value::DieSum(_) => "a die roll".to_string(),
            Value::Prerequisite { value, op, threshold } => {
                format!("{} {} {threshold}", value.describe(), op.phrase())
            }
        }
    }
}

fn read_attribute(state: &GameState, target: &Target, attribute: &str) -> Result<f64, EngineError> {
    let found = match target {
        Target::Character(id) => state.character_attribute(*id, attribute)?,
        Target::Monster(id) => state.monster(*id)?.attribute(attribute),
        Target::Place(id) => state.place_attribute(*id, attribute)?,
        Target::Event(event) => {
            let id = event.id()?;
            state.event(id)?.attribute(attribute)
        }
        Target::Global(slot) => state
            .global(*slot)
            .and_then(|global| global.counter(attribute))
            .map(|n| n as f64),
    };
    found.ok_or_else(|| EngineError::missing(describe_target(target), attribute))
}

fn describe_target(target: &Target) -> String {
    match target {
        Target::Character(id) => id.to_string(),
        Target::Monster(id) => id.to_string(),
        Target::Place(id) => id.to_string(),
        Target::Event(EventRef::Placed(id)) => id.to_string(),
        Target::Event(EventRef::Pending(_)) => "unplaced event".to_string(),
        Target::Global(slot) => slot.to_string(),
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Const(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Const(f64::from(v))
    }
}

impl<T: Into<Value>> std::ops::Add<T> for Value {
    type Output = Value;
    fn add(self, rhs: T) -> Value {
        self.binary(Operator::Add, rhs)
    }
}

impl<T: Into<Value>> std::ops::Sub<T> for Value {
    type Output = Value;
    fn sub(self, rhs: T) -> Value {
        self.binary(Operator::Sub, rhs)
    }
}

impl<T: Into<Value>> std::ops::Mul<T> for Value {
    type Output = Value;
    fn mul(self, rhs: T) -> Value {
        self.binary(Operator::Mul, rhs)
    }
}

impl<T: Into<Value>> std::ops::Div<T> for Value {
    type Output = Value;
    fn div(self, rhs: T) -> Value {
        self.binary(Operator::Div, rhs)
    }
}

impl std::ops::Neg for Value {
    type Output = Value;
    fn neg(self) -> Value {
        self.unary(UnaryOp::Neg)
    }
}
