//! Signal expression language and generators for simulation inputs

pub mod generators;
pub mod expr;
pub mod eval;

pub use expr::{Builtin, Expr, ExpressionError};
pub use eval::{index_vector, SignalExpression};
