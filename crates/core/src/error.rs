//! # Error Types
//!
//! Every failure in the additive machinery is a programming or extension
//! error: a type that was never registered, an operand that is not an array,
//! two descriptors with no join. None of them are retried at this layer; they
//! propagate unchanged to the interpreter or user code that made the call.

use thiserror::Error;

use crate::shape::Shape;

/// Core errors for registries, primitives and the descriptor lattice.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Lookup on a registry for a type that was never registered.
    #[error("No {registry} handler registered for type {type_name}")]
    Unregistered {
        registry: &'static str,
        type_name: &'static str,
    },

    /// A primitive was handed a value it cannot operate on.
    #[error("{primitive} only works on valid arrays, but input argument is: {value}")]
    InvalidOperand {
        primitive: &'static str,
        value: String,
    },

    /// The two operands of a binary primitive have different concrete types.
    #[error("{primitive} operands must share a type, got {left} and {right}")]
    OperandTypeMismatch {
        primitive: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// Shapes don't agree where they must.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Lattice join of two descriptors of unrelated kinds.
    #[error("Cannot join abstract values {left} and {right}")]
    JoinUndefined { left: String, right: String },

    /// A primitive was bound with the wrong number of arguments.
    #[error("{primitive} expects {expected} argument(s), got {got}")]
    Arity {
        primitive: &'static str,
        expected: usize,
        got: usize,
    },

    /// A primitive is missing an evaluation rule.
    #[error("{primitive} has no {rule} rule")]
    MissingRule {
        primitive: &'static str,
        rule: &'static str,
    },

    /// The value has no abstract descriptor.
    #[error("Value of type {type_name} has no abstract value")]
    NoAbstractValue { type_name: &'static str },

    /// Flattened leaves or tree definition don't fit the requested type.
    #[error("Tree mismatch: expected {expected}, got {got}")]
    TreeMismatch { expected: String, got: String },

    /// Configuration could not be loaded.
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}
