//! # Type-Keyed Registries
//!
//! A registry maps a runtime type to a handler. The additive machinery keeps
//! several of them (adders keyed by value type, zero constructors keyed by
//! value type or by descriptor type), and the tree registry keeps another.
//!
//! ## Design
//!
//! - [`TypeKey`]: a `std::any::TypeId` paired with the type's name, so that a
//!   failed lookup can say *which* type was missing
//! - [`AsAny`]: blanket helper that recovers the concrete type behind a
//!   trait object (`dyn JaxVal`, `dyn AbstractValue`)
//! - [`TypeRegistry`]: the map itself, last write wins
//!
//! Registries are shared between a context and the primitives whose rules
//! dispatch through them, so registration goes through an `RwLock` and takes
//! `&self`. Steady-state lookups only take the read side.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::CoreError;

// ============================================================================
// Type Keys
// ============================================================================

/// Identity of a concrete runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for the type `T`.
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name, for error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Access to the concrete type behind a trait object.
///
/// Implemented for every `'static` type with `PartialEq`, so value and
/// descriptor traits can require it as a supertrait without asking
/// implementors for boilerplate.
pub trait AsAny: Any {
    /// Upcast to `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Key of the concrete type.
    fn type_key(&self) -> TypeKey;

    /// Equality against another type-erased value; false if types differ.
    fn dyn_eq(&self, other: &dyn Any) -> bool;
}

impl<T: Any + PartialEq> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

// ============================================================================
// TypeRegistry
// ============================================================================

/// A registry of handlers indexed by runtime type.
///
/// `H` is usually an unsized closure type such as
/// `dyn Fn(&Value, &Value) -> Result<Value, CoreError> + Send + Sync`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use zeroad_core::registry::{TypeKey, TypeRegistry};
///
/// type Describe = dyn Fn() -> String + Send + Sync;
///
/// let registry: TypeRegistry<Describe> = TypeRegistry::new("describe");
/// registry.register(TypeKey::of::<u8>(), Arc::new(|| "a byte".to_string()));
///
/// let handler = registry.lookup(TypeKey::of::<u8>()).unwrap();
/// assert_eq!(handler(), "a byte");
/// assert!(registry.lookup(TypeKey::of::<u16>()).is_err());
/// ```
pub struct TypeRegistry<H: ?Sized> {
    name: &'static str,
    handlers: RwLock<HashMap<TypeKey, Arc<H>>>,
}

impl<H: ?Sized> TypeRegistry<H> {
    /// Create an empty registry. `name` appears in lookup errors and logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert or overwrite the handler for `key`.
    ///
    /// Returns `true` if an earlier handler was replaced.
    pub fn register(&self, key: TypeKey, handler: Arc<H>) -> bool {
        let replaced = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, handler)
            .is_some();
        debug!(registry = self.name, type_name = key.name(), replaced, "registered handler");
        replaced
    }

    /// Find the handler for `key`.
    ///
    /// Returns `Unregistered` if nothing was ever registered for it.
    pub fn lookup(&self, key: TypeKey) -> Result<Arc<H>, CoreError> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or(CoreError::Unregistered {
                registry: self.name,
                type_name: key.name(),
            })
    }

    /// Check whether a handler exists for `key`.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: ?Sized> fmt::Debug for TypeRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("name", &self.name)
            .field("handler_count", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
