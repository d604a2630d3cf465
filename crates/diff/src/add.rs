//! # Additive Combination
//!
//! Cotangents reaching the same variable along several paths are summed with
//! `add_jaxvals`. The operation is a primitive (`add_any`) so that traces can
//! intercept it like any other; when evaluated, it looks up the adder
//! registered for the operands' concrete type.
//!
//! | Operands | Result |
//! |----------|--------|
//! | both have the `AbstractUnit` descriptor | `Unit`, no dispatch |
//! | same registered type | that type's adder |
//! | unregistered type | `Unregistered` error |
//! | different types (strict policy) | `OperandTypeMismatch` error |
//!
//! The abstract evaluation rule is the lattice join of the operand
//! descriptors, so shape-tracking traces never run the adder.

use std::sync::Arc;

use tracing::trace;
use zeroad_core::{lattice_join, CoreError, JaxVal, Primitive, TypeKey, TypeRegistry, Value};

use crate::config::{AdConfig, OperandTypePolicy};
use crate::context::AdContext;

/// Name of the additive-combination primitive.
pub const ADD_ANY: &str = "add_any";

/// Name of the adder registry, as it appears in lookup errors.
pub const ADD_JAXVALS: &str = "add_jaxvals";

/// A value type that knows how to add two of its own values.
pub trait Combinable: JaxVal + Sized {
    fn add(&self, other: &Self) -> Result<Self, CoreError>;
}

/// Type-erased adder.
pub type Adder = dyn Fn(&Value, &Value) -> Result<Value, CoreError> + Send + Sync;

/// Adders keyed by concrete value type.
pub type AdderRegistry = TypeRegistry<Adder>;

pub(crate) fn build_add_any(adders: Arc<AdderRegistry>, config: &AdConfig) -> Primitive {
    let policy = config.operand_types;
    let log_dispatch = config.log_dispatch;

    Primitive::new(ADD_ANY, 2)
        .def_impl(move |args, _| {
            let (x, y) = (&args[0], &args[1]);
            if policy == OperandTypePolicy::Strict && x.type_key() != y.type_key() {
                return Err(CoreError::OperandTypeMismatch {
                    primitive: ADD_ANY,
                    left: x.type_name(),
                    right: y.type_name(),
                });
            }
            let adder = adders.lookup(x.type_key())?;
            if log_dispatch {
                trace!(primitive = ADD_ANY, type_name = x.type_name(), "dispatching adder");
            }
            adder(x, y)
        })
        .def_abstract_eval(|avals, _| lattice_join(&avals[0], &avals[1]))
}

fn operand<T: JaxVal>(value: &Value) -> Result<&T, CoreError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| CoreError::OperandTypeMismatch {
            primitive: ADD_ANY,
            left: std::any::type_name::<T>(),
            right: value.type_name(),
        })
}

impl AdContext {
    /// Sum two values of matching abstract type.
    pub fn add_jaxvals(&self, x: &Value, y: &Value) -> Result<Value, CoreError> {
        if x.aval()?.is_unit() && y.aval()?.is_unit() {
            return Ok(Value::unit());
        }
        self.add_jaxvals_p.bind(&[x.clone(), y.clone()])
    }

    /// Register the adder for values of type `T`.
    ///
    /// Replaces any earlier adder for `T`.
    pub fn register_adder<T, F>(&self, adder: F)
    where
        T: JaxVal,
        F: Fn(&T, &T) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        let erased = move |x: &Value, y: &Value| -> Result<Value, CoreError> {
            let sum = adder(operand::<T>(x)?, operand::<T>(y)?)?;
            Ok(Value::new(sum))
        };
        self.adders.register(TypeKey::of::<T>(), Arc::new(erased));
    }

    /// Register an adder that works on type-erased values directly.
    ///
    /// Under the `FirstOperand` policy the second operand may be of any type.
    pub fn register_dyn_adder(&self, key: TypeKey, adder: Arc<Adder>) {
        self.adders.register(key, adder);
    }

    /// Register `T`'s own `Combinable::add` as its adder.
    pub fn register_combinable<T: Combinable>(&self) {
        self.register_adder(|x: &T, y: &T| x.add(y));
    }

    pub fn has_adder<T: JaxVal>(&self) -> bool {
        self.adders.contains(TypeKey::of::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zeroad_core::{Aval, Params, Shape, Trace, Tracer, Unit};

    #[derive(Debug, Clone, PartialEq)]
    struct Tally(u32);

    impl JaxVal for Tally {
        fn aval(&self) -> Result<Aval, CoreError> {
            Ok(Aval::new(Shape::scalar(zeroad_core::DType("u32"))))
        }
    }

    impl Combinable for Tally {
        fn add(&self, other: &Self) -> Result<Self, CoreError> {
            Ok(Tally(self.0 + other.0))
        }
    }

    /// A placeholder type of its own with the `AbstractUnit` descriptor.
    #[derive(Debug, Clone, PartialEq)]
    struct NoData;

    impl JaxVal for NoData {
        fn aval(&self) -> Result<Aval, CoreError> {
            Ok(Aval::unit())
        }
    }

    #[derive(Debug, Default)]
    struct CountingTrace {
        calls: AtomicUsize,
    }

    impl Trace for CountingTrace {
        fn level(&self) -> usize {
            1
        }

        fn process_primitive(
            &self,
            primitive: &Primitive,
            args: &[Value],
            params: &Params,
        ) -> Result<Value, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lowered: Vec<Value> = args.iter().cloned().map(zeroad_core::full_lower).collect();
            primitive.evaluate(&lowered, params)
        }
    }

    #[derive(Debug, Clone)]
    struct Counted {
        trace: Arc<CountingTrace>,
        value: Value,
    }

    impl PartialEq for Counted {
        fn eq(&self, other: &Self) -> bool {
            self.value == other.value
        }
    }

    impl JaxVal for Counted {
        fn aval(&self) -> Result<Aval, CoreError> {
            self.value.aval()
        }

        fn as_tracer(&self) -> Option<&dyn Tracer> {
            Some(self)
        }
    }

    impl Tracer for Counted {
        fn trace(&self) -> Arc<dyn Trace> {
            self.trace.clone()
        }

        fn full_lower(&self) -> Value {
            self.value.clone()
        }
    }

    fn counted(trace: &Arc<CountingTrace>, value: Value) -> Value {
        Value::new(Counted {
            trace: trace.clone(),
            value,
        })
    }

    #[test]
    fn test_units_short_circuit() {
        let ctx = AdContext::new();
        let out = ctx.add_jaxvals(&Value::unit(), &Value::new(Unit)).unwrap();
        assert!(out.is_unit());
    }

    #[test]
    fn test_unit_descriptors_need_no_adder() {
        let ctx = AdContext::new();
        assert!(!ctx.has_adder::<NoData>());

        let out = ctx
            .add_jaxvals(&Value::new(NoData), &Value::new(NoData))
            .unwrap();
        assert_eq!(out, Value::unit());
    }

    #[test]
    fn test_unit_tracers_skip_the_trace() {
        let ctx = AdContext::new();
        let trace = Arc::new(CountingTrace::default());

        let out = ctx
            .add_jaxvals(&counted(&trace, Value::unit()), &counted(&trace, Value::unit()))
            .unwrap();

        assert_eq!(trace.calls.load(Ordering::SeqCst), 0);
        assert_eq!(out, Value::unit());
    }

    #[test]
    fn test_array_tracers_go_through_the_trace() {
        let ctx = AdContext::new();
        let trace = Arc::new(CountingTrace::default());
        let x = counted(&trace, Value::new(Array::scalar(1.0)));
        let y = counted(&trace, Value::new(Array::scalar(2.0)));

        let out = ctx.add_jaxvals(&x, &y).unwrap();

        assert_eq!(trace.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out, Value::new(Array::scalar(3.0)));
    }

    #[test]
    fn test_builtin_array_adder() {
        let ctx = AdContext::new();
        let x = Value::new(Array::vector(vec![1.0, 2.0]));
        let y = Value::new(Array::vector(vec![3.0, 4.0]));

        let out = ctx.add_jaxvals(&x, &y).unwrap();
        assert_eq!(out, Value::new(Array::vector(vec![4.0, 6.0])));
    }

    #[test]
    fn test_register_combinable() {
        let ctx = AdContext::new();
        assert!(!ctx.has_adder::<Tally>());

        ctx.register_combinable::<Tally>();

        assert!(ctx.has_adder::<Tally>());
        let out = ctx
            .add_jaxvals(&Value::new(Tally(2)), &Value::new(Tally(5)))
            .unwrap();
        assert_eq!(out.downcast_ref::<Tally>(), Some(&Tally(7)));
    }

    #[test]
    fn test_unregistered_type_fails() {
        let ctx = AdContext::new();
        let err = ctx
            .add_jaxvals(&Value::new(Tally(1)), &Value::new(Tally(1)))
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Unregistered {
                registry: ADD_JAXVALS,
                ..
            }
        ));
    }

    #[test]
    fn test_strict_policy_rejects_mixed_types() {
        let ctx = AdContext::new();
        ctx.register_combinable::<Tally>();

        let err = ctx
            .add_jaxvals(&Value::new(Tally(1)), &Value::new(Array::scalar(1.0)))
            .unwrap_err();
        assert!(matches!(err, CoreError::OperandTypeMismatch { .. }));
    }

    #[test]
    fn test_first_operand_policy_hands_both_to_adder() {
        let ctx = AdContext::with_config(
            AdConfig::default().with_operand_types(OperandTypePolicy::FirstOperand),
        );
        ctx.register_dyn_adder(
            TypeKey::of::<Tally>(),
            Arc::new(|x: &Value, y: &Value| -> Result<Value, CoreError> {
                let base = x.downcast_ref::<Tally>().map_or(0, |t| t.0);
                let extra = y.downcast_ref::<Array>().and_then(Array::as_scalar).unwrap_or(0.0);
                Ok(Value::new(Tally(base + extra as u32)))
            }),
        );

        let out = ctx
            .add_jaxvals(&Value::new(Tally(1)), &Value::new(Array::scalar(2.0)))
            .unwrap();
        assert_eq!(out, Value::new(Tally(3)));
    }

    #[test]
    fn test_abstract_eval_is_join() {
        let ctx = AdContext::new();
        let prim = ctx.add_any_primitive();
        let aval = Aval::new(Shape::f32_vector(3));

        let out = prim
            .abstract_eval(&[aval.clone(), aval.clone()], &Params::new())
            .unwrap();
        assert_eq!(out, aval);

        let err = prim
            .abstract_eval(&[aval, Aval::new(Shape::f32_vector(2))], &Params::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_invalid_operand_has_no_aval() {
        let ctx = AdContext::new();
        let err = ctx
            .add_jaxvals(&Value::new("a".to_string()), &Value::new("b".to_string()))
            .unwrap_err();
        assert!(matches!(err, CoreError::NoAbstractValue { .. }));
    }
}
