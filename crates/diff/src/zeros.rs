//! # Additive Identity
//!
//! Two ways to get a zero:
//!
//! - [`AdContext::zeros_like_jaxval`] binds the `zeros_like` primitive on an
//!   example value. Traces can intercept it; evaluation dispatches on the
//!   example's concrete type.
//! - [`AdContext::zeros_like_aval`] is a plain call on a descriptor. It
//!   dispatches eagerly on the descriptor's type and never goes through bind.
//!
//! Each path has its own registry. The `AbstractUnit` descriptor and the
//! `Unit` value are registered at context start-up and both produce `Unit`.

use std::sync::Arc;

use tracing::trace;
use zeroad_core::{AbstractValue, Aval, CoreError, JaxVal, Primitive, TypeKey, TypeRegistry, Value};

use crate::config::AdConfig;
use crate::context::AdContext;

/// Name of the additive-identity primitive.
pub const ZEROS_LIKE: &str = "zeros_like";

/// Name of the registry keyed by example value type.
pub const ZEROS_LIKE_JAXVAL: &str = "zeros_like_jaxval";

/// Name of the registry keyed by descriptor type.
pub const ZEROS_LIKE_AVAL: &str = "zeros_like_aval";

/// A value type that can build its additive identity from a descriptor.
pub trait ZeroConstructible: JaxVal + Sized {
    type Descriptor: AbstractValue;

    fn zero_for(aval: &Self::Descriptor) -> Self;
}

/// Zero constructor selected by an example value.
pub type ZerosLiker = dyn Fn(&Value) -> Result<Value, CoreError> + Send + Sync;

/// Zero constructor selected by a descriptor.
pub type AvalZerosLiker = dyn Fn(&Aval) -> Result<Value, CoreError> + Send + Sync;

pub type ZerosLikeRegistry = TypeRegistry<ZerosLiker>;

pub type AvalZerosLikeRegistry = TypeRegistry<AvalZerosLiker>;

pub(crate) fn build_zeros_like(likers: Arc<ZerosLikeRegistry>, config: &AdConfig) -> Primitive {
    let log_dispatch = config.log_dispatch;

    Primitive::new(ZEROS_LIKE, 1)
        .def_impl(move |args, _| {
            let example = &args[0];
            let liker = likers.lookup(example.type_key())?;
            if log_dispatch {
                trace!(primitive = ZEROS_LIKE, type_name = example.type_name(), "dispatching zeros-liker");
            }
            liker(example)
        })
        .def_abstract_eval(|avals, _| Ok(avals[0].clone()))
}

impl AdContext {
    /// Zero matching the concrete type of `val`, through the `zeros_like`
    /// primitive.
    pub fn zeros_like_jaxval(&self, val: &Value) -> Result<Value, CoreError> {
        self.zeros_like_p.bind(std::slice::from_ref(val))
    }

    /// Zero matching the descriptor `aval`, evaluated immediately.
    pub fn zeros_like_aval(&self, aval: &Aval) -> Result<Value, CoreError> {
        let liker = self.aval_zeros.lookup(aval.type_key())?;
        liker(aval)
    }

    /// Register the zero constructor used when an example value of type `T`
    /// is given.
    pub fn register_zeros_like_jaxval<T, F>(&self, liker: F)
    where
        T: JaxVal,
        F: Fn(&T) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        let erased = move |example: &Value| -> Result<Value, CoreError> {
            let example = example.downcast_ref::<T>().ok_or(CoreError::Unregistered {
                registry: ZEROS_LIKE_JAXVAL,
                type_name: example.type_name(),
            })?;
            Ok(Value::new(liker(example)?))
        };
        self.jaxval_zeros.register(TypeKey::of::<T>(), Arc::new(erased));
    }

    /// Register the zero constructor used for descriptors of type `A`.
    pub fn register_zeros_like_aval<A, T, F>(&self, liker: F)
    where
        A: AbstractValue,
        T: JaxVal,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        let erased = move |aval: &Aval| -> Result<Value, CoreError> {
            let descriptor = aval.downcast_ref::<A>().ok_or(CoreError::Unregistered {
                registry: ZEROS_LIKE_AVAL,
                type_name: aval.type_name(),
            })?;
            Ok(Value::new(liker(descriptor)))
        };
        self.aval_zeros.register(TypeKey::of::<A>(), Arc::new(erased));
    }

    /// Register both zero-construction paths for `T` from its
    /// `ZeroConstructible` impl.
    pub fn register_zero_constructible<T: ZeroConstructible>(&self) {
        self.register_zeros_like_aval(|aval: &T::Descriptor| T::zero_for(aval));
        self.register_zeros_like_jaxval(|example: &T| {
            let aval = example.aval()?;
            aval.downcast_ref::<T::Descriptor>()
                .map(T::zero_for)
                .ok_or(CoreError::Unregistered {
                    registry: ZEROS_LIKE_JAXVAL,
                    type_name: aval.type_name(),
                })
        });
    }

    pub fn has_zeros_like_jaxval<T: JaxVal>(&self) -> bool {
        self.jaxval_zeros.contains(TypeKey::of::<T>())
    }

    pub fn has_zeros_like_aval<A: AbstractValue>(&self) -> bool {
        self.aval_zeros.contains(TypeKey::of::<A>())
    }
}
