//! Deferred scalar expressions evaluated against live state.

mod value;

pub use value::{Comparison, Operator, Target, UnaryOp, Value};
