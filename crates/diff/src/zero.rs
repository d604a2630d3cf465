//! # Symbolic Zero
//!
//! Many cotangents in a backward pass are structurally zero: a branch that
//! was never used, an integer input with no sensitivity. [`Zero`] stands for
//! "additive identity, not materialized" and carries no data, so nothing is
//! allocated for it and it needs no descriptor.
//!
//! Cotangents are either symbolic zeros or concrete values, modelled as
//! [`Cotangent`] so consumers match on the case instead of comparing against
//! a shared instance.
//!
//! ## Tree decomposition
//!
//! `Zero` flattens to no leaves and no auxiliary data, and any unflatten of
//! its tree definition yields `Zero` again. It therefore always occupies a
//! whole tree position and never appears as a leaf.

use std::fmt;

use zeroad_core::{TreeRegistry, Value};

/// The symbolic zero. All instances are interchangeable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Zero;

/// The process-wide symbolic zero.
pub const ZERO: Zero = Zero;

impl fmt::Debug for Zero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zero")
    }
}

impl fmt::Display for Zero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zero")
    }
}

/// A backward-flowing derivative value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cotangent {
    /// Symbolically zero.
    #[default]
    Zero,
    /// A concrete value.
    Value(Value),
}

impl Cotangent {
    pub fn is_zero(&self) -> bool {
        matches!(self, Cotangent::Zero)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cotangent::Zero => None,
            Cotangent::Value(value) => Some(value),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Cotangent::Zero => None,
            Cotangent::Value(value) => Some(value),
        }
    }
}

impl From<Zero> for Cotangent {
    fn from(_: Zero) -> Self {
        Cotangent::Zero
    }
}

impl From<Value> for Cotangent {
    fn from(value: Value) -> Self {
        Cotangent::Value(value)
    }
}

impl fmt::Display for Cotangent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cotangent::Zero => fmt::Display::fmt(&ZERO, f),
            Cotangent::Value(value) => write!(f, "{:?}", value),
        }
    }
}

/// Register `Zero` and `Cotangent` as tree nodes.
///
/// A concrete cotangent flattens to its single value; a zero to nothing.
pub fn register_tree_nodes(trees: &TreeRegistry) {
    trees.register::<Zero, (), _, _>(|_| (Vec::new(), None), |_, _| ZERO);
    trees.register::<Cotangent, (), _, _>(
        |ct| match ct {
            Cotangent::Zero => (Vec::new(), None),
            Cotangent::Value(value) => (vec![value.clone()], None),
        },
        |_, mut leaves| match leaves.pop() {
            Some(value) => Cotangent::Value(value),
            None => Cotangent::Zero,
        },
    );
}
