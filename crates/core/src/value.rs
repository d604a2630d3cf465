//! # Values
//!
//! Concrete values flowing through an interpreter are open-ended: dense
//! arrays, the no-data [`Unit`], tracers, user-defined boxes. They share the
//! [`JaxVal`] trait and travel as a cheap-to-clone [`Value`] handle.
//!
//! Dispatch through the registries keys on the concrete type behind the
//! handle ([`Value::type_key`]).

use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;
use crate::registry::{AsAny, TypeKey};
use crate::shape::Aval;
use crate::trace::Tracer;

/// A value an interpreter can operate on.
pub trait JaxVal: AsAny + fmt::Debug + Send + Sync {
    /// The value's abstract descriptor.
    ///
    /// Fails with `NoAbstractValue` for values that are not valid array types.
    fn aval(&self) -> Result<Aval, CoreError>;

    /// Tracers override this to expose their trace.
    fn as_tracer(&self) -> Option<&dyn Tracer> {
        None
    }
}

/// Shared handle to a type-erased value.
#[derive(Clone)]
pub struct Value(Arc<dyn JaxVal>);

impl Value {
    pub fn new<V: JaxVal>(value: V) -> Self {
        Self(Arc::new(value))
    }

    /// The canonical no-data value.
    pub fn unit() -> Self {
        Self::new(Unit)
    }

    pub fn is_unit(&self) -> bool {
        self.downcast_ref::<Unit>().is_some()
    }

    pub fn aval(&self) -> Result<Aval, CoreError> {
        self.0.aval()
    }

    /// True if the value has an abstract descriptor.
    pub fn is_valid(&self) -> bool {
        self.0.aval().is_ok()
    }

    /// Key of the concrete type, used for adder and zero-constructor lookup.
    pub fn type_key(&self) -> TypeKey {
        self.0.type_key()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key().name()
    }

    pub fn downcast_ref<V: JaxVal>(&self) -> Option<&V> {
        self.0.as_any().downcast_ref::<V>()
    }

    pub fn as_tracer(&self) -> Option<&dyn Tracer> {
        self.0.as_tracer()
    }

    /// True if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_any())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Free-function form of [`Value::aval`].
pub fn get_aval(value: &Value) -> Result<Aval, CoreError> {
    value.aval()
}

/// True if `value` is a valid array type.
pub fn valid_jaxtype(value: &Value) -> bool {
    value.is_valid()
}

// ============================================================================
// Built-in values
// ============================================================================

/// The no-data placeholder value. Its descriptor is `AbstractUnit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unit;

impl JaxVal for Unit {
    fn aval(&self) -> Result<Aval, CoreError> {
        Ok(Aval::unit())
    }
}

/// Strings can be carried through an interpreter but are never arrays.
impl JaxVal for String {
    fn aval(&self) -> Result<Aval, CoreError> {
        Err(CoreError::NoAbstractValue {
            type_name: std::any::type_name::<String>(),
        })
    }
}
