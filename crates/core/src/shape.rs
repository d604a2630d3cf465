//! # Abstract Values
//!
//! An abstract value (aval) describes a value's type and shape without its
//! data. Interpreters reason about avals to know what an operation returns
//! without running it.
//!
//! Two descriptors are built in:
//!
//! - [`Shape`]: a dense array descriptor, element type plus dimensions
//! - [`AbstractUnit`]: the degenerate descriptor of the no-data [`Unit`] value
//!
//! Other crates add descriptors by implementing [`AbstractValue`]. Descriptors
//! form a lattice; [`lattice_join`] finds the least upper bound of two of them.
//!
//! [`Unit`]: crate::value::Unit

use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;
use crate::registry::{AsAny, TypeKey};

/// Element type of an array.
///
/// Examples: "f32", "i64", "bool"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DType(pub &'static str);

impl DType {
    pub const F32: DType = DType("f32");
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// AbstractValue
// ============================================================================

/// A descriptor in the abstract-value lattice.
pub trait AbstractValue: AsAny + fmt::Debug + fmt::Display + Send + Sync {
    /// Least upper bound of `self` and `other`.
    fn join(&self, other: &Aval) -> Result<Aval, CoreError>;
}

/// Shared handle to a type-erased abstract value.
#[derive(Clone)]
pub struct Aval(Arc<dyn AbstractValue>);

impl Aval {
    pub fn new<A: AbstractValue>(aval: A) -> Self {
        Self(Arc::new(aval))
    }

    /// The degenerate descriptor.
    pub fn unit() -> Self {
        Self::new(AbstractUnit)
    }

    pub fn is_unit(&self) -> bool {
        self.downcast_ref::<AbstractUnit>().is_some()
    }

    /// Key of the concrete descriptor type, used for zero-constructor lookup.
    pub fn type_key(&self) -> TypeKey {
        self.0.type_key()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key().name()
    }

    pub fn downcast_ref<A: AbstractValue>(&self) -> Option<&A> {
        self.0.as_any().downcast_ref::<A>()
    }

    /// Least upper bound with `other`.
    pub fn join(&self, other: &Aval) -> Result<Aval, CoreError> {
        self.0.join(other)
    }
}

impl PartialEq for Aval {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_any())
    }
}

impl fmt::Debug for Aval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Aval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// Join two descriptors.
pub fn lattice_join(left: &Aval, right: &Aval) -> Result<Aval, CoreError> {
    left.join(right)
}

fn join_undefined(left: &dyn fmt::Display, right: &Aval) -> CoreError {
    CoreError::JoinUndefined {
        left: left.to_string(),
        right: right.to_string(),
    }
}

// ============================================================================
// AbstractUnit
// ============================================================================

/// Descriptor of the no-data placeholder value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AbstractUnit;

impl fmt::Display for AbstractUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*")
    }
}

impl AbstractValue for AbstractUnit {
    fn join(&self, other: &Aval) -> Result<Aval, CoreError> {
        if other.is_unit() {
            Ok(Aval::unit())
        } else {
            Err(join_undefined(self, other))
        }
    }
}

// ============================================================================
// Shape
// ============================================================================

/// A dense array descriptor.
///
/// Shapes join only with equal shapes; there is no weakening to an unshaped
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    /// The element type
    pub dtype: DType,
    /// Dimension sizes (empty = scalar, [n] = vector, [m,n] = matrix, etc.)
    pub dims: Vec<usize>,
}

impl Shape {
    pub fn new(dtype: DType, dims: Vec<usize>) -> Self {
        Self { dtype, dims }
    }

    pub fn scalar(dtype: DType) -> Self {
        Self { dtype, dims: vec![] }
    }

    pub fn vector(dtype: DType, len: usize) -> Self {
        Self {
            dtype,
            dims: vec![len],
        }
    }

    pub fn matrix(dtype: DType, rows: usize, cols: usize) -> Self {
        Self {
            dtype,
            dims: vec![rows, cols],
        }
    }

    /// Convenience: f32 scalar
    pub fn f32_scalar() -> Self {
        Self::scalar(DType::F32)
    }

    /// Convenience: f32 vector
    pub fn f32_vector(len: usize) -> Self {
        Self::vector(DType::F32, len)
    }

    /// Convenience: f32 matrix
    pub fn f32_matrix(rows: usize, cols: usize) -> Self {
        Self::matrix(DType::F32, rows, cols)
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_compatible(&self, other: &Shape) -> bool {
        self == other
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dims.is_empty() {
            write!(f, "{}[]", self.dtype)
        } else {
            write!(
                f,
                "{}[{}]",
                self.dtype,
                self.dims
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    }
}

impl AbstractValue for Shape {
    fn join(&self, other: &Aval) -> Result<Aval, CoreError> {
        let other_shape = other
            .downcast_ref::<Shape>()
            .ok_or_else(|| join_undefined(self, other))?;
        if self.is_compatible(other_shape) {
            Ok(Aval::new(self.clone()))
        } else {
            Err(CoreError::ShapeMismatch {
                expected: self.clone(),
                got: other_shape.clone(),
            })
        }
    }
}
