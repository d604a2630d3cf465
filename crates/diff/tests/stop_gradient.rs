//! # Stop-Gradient Under Traces
//!
//! A recording trace stands in for a differentiation or staging interpreter.
//! It logs every primitive it is asked to process, evaluates it on the
//! lowered arguments and wraps the result. A second trace layered on top
//! returns that result as a tracer, to check that bind fully lowers it.

use std::sync::{Arc, Mutex};

use zeroad_core::{full_lower, Aval, CoreError, JaxVal, Params, Primitive, Trace, Tracer, Value};
use zeroad_diff::{AdContext, Array, STOP_GRADIENT};

// ============================================================================
// Recording Trace
// ============================================================================

#[derive(Debug, Clone)]
struct Call {
    primitive: &'static str,
    args: Vec<Value>,
    params: Params,
}

#[derive(Debug, Default)]
struct RecordingTrace {
    calls: Mutex<Vec<Call>>,
}

impl RecordingTrace {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Trace for RecordingTrace {
    fn level(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn process_primitive(
        &self,
        primitive: &Primitive,
        args: &[Value],
        params: &Params,
    ) -> Result<Value, CoreError> {
        self.calls.lock().unwrap().push(Call {
            primitive: primitive.name(),
            args: args.to_vec(),
            params: params.clone(),
        });
        let lowered: Vec<Value> = args.iter().cloned().map(full_lower).collect();
        let out = primitive.evaluate(&lowered, params)?;
        Ok(Value::new(Recorded { value: out }))
    }
}

/// Output of `RecordingTrace`. Not a tracer, so `full_lower` keeps it.
#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    value: Value,
}

impl JaxVal for Recorded {
    fn aval(&self) -> Result<Aval, CoreError> {
        self.value.aval()
    }
}

/// Input tracer: a value the recording trace is tracking.
#[derive(Debug, Clone)]
struct Tracked {
    trace: Arc<RecordingTrace>,
    value: Value,
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.trace, &other.trace) && self.value == other.value
    }
}

impl JaxVal for Tracked {
    fn aval(&self) -> Result<Aval, CoreError> {
        self.value.aval()
    }

    fn as_tracer(&self) -> Option<&dyn Tracer> {
        Some(self)
    }
}

impl Tracer for Tracked {
    fn trace(&self) -> Arc<dyn Trace> {
        self.trace.clone()
    }

    fn full_lower(&self) -> Value {
        self.value.clone()
    }
}

/// A `Recorded` output that `full_lower` can see through.
#[derive(Debug, Clone, PartialEq)]
struct RecordedTracer(Recorded);

impl JaxVal for RecordedTracer {
    fn aval(&self) -> Result<Aval, CoreError> {
        self.0.value.aval()
    }

    fn as_tracer(&self) -> Option<&dyn Tracer> {
        Some(self)
    }
}

impl Tracer for RecordedTracer {
    fn trace(&self) -> Arc<dyn Trace> {
        Arc::new(RecordingTrace::default())
    }

    fn full_lower(&self) -> Value {
        self.0.value.clone()
    }
}

fn track(trace: &Arc<RecordingTrace>, value: Value) -> Value {
    Value::new(Tracked {
        trace: trace.clone(),
        value,
    })
}

// ============================================================================
// No active trace
// ============================================================================

#[test]
fn test_no_trace_returns_input_unchanged() {
    let ctx = AdContext::new();
    let trace = Arc::new(RecordingTrace::default());
    let x = Value::new(Array::vector(vec![1.0, -1.0]));

    let out = ctx.stop_gradient(&x).unwrap();

    assert!(out.ptr_eq(&x));
    assert!(trace.calls().is_empty());
}

#[test]
fn test_no_trace_skips_validity_check() {
    // The impl rule never runs on the shortcut path.
    let ctx = AdContext::new();
    let x = Value::new("label".to_string());

    let out = ctx.stop_gradient(&x).unwrap();
    assert!(out.ptr_eq(&x));
}

// ============================================================================
// Active trace
// ============================================================================

#[test]
fn test_active_trace_processes_primitive_once() {
    let ctx = AdContext::new();
    let trace = Arc::new(RecordingTrace::default());
    let x = track(&trace, Value::new(Array::scalar(2.0)));

    let out = ctx.stop_gradient(&x).unwrap();

    let calls = trace.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].primitive, STOP_GRADIENT);
    assert_eq!(calls[0].args.len(), 1);
    assert!(calls[0].args[0].ptr_eq(&x));
    assert!(calls[0].params.is_empty());

    // The trace's output is not a lowerable tracer, so it comes back as is.
    assert_eq!(
        out,
        Value::new(Recorded {
            value: Value::new(Array::scalar(2.0)),
        })
    );
}

#[test]
fn test_active_trace_result_is_fully_lowered() {
    #[derive(Debug, Default)]
    struct LoweringTrace {
        inner: RecordingTrace,
    }

    impl Trace for LoweringTrace {
        fn level(&self) -> usize {
            2
        }

        fn process_primitive(
            &self,
            primitive: &Primitive,
            args: &[Value],
            params: &Params,
        ) -> Result<Value, CoreError> {
            let out = self.inner.process_primitive(primitive, args, params)?;
            let recorded = out.downcast_ref::<Recorded>().cloned().ok_or_else(|| {
                CoreError::InvalidOperand {
                    primitive: "lowering",
                    value: format!("{:?}", out),
                }
            })?;
            Ok(Value::new(RecordedTracer(recorded)))
        }
    }

    #[derive(Debug, Clone)]
    struct LoweringTracked {
        trace: Arc<LoweringTrace>,
        value: Value,
    }

    impl PartialEq for LoweringTracked {
        fn eq(&self, other: &Self) -> bool {
            self.value == other.value
        }
    }

    impl JaxVal for LoweringTracked {
        fn aval(&self) -> Result<Aval, CoreError> {
            self.value.aval()
        }

        fn as_tracer(&self) -> Option<&dyn Tracer> {
            Some(self)
        }
    }

    impl Tracer for LoweringTracked {
        fn trace(&self) -> Arc<dyn Trace> {
            self.trace.clone()
        }

        fn full_lower(&self) -> Value {
            self.value.clone()
        }
    }

    let ctx = AdContext::new();
    let trace = Arc::new(LoweringTrace::default());
    let concrete = Value::new(Array::vector(vec![3.0, 4.0]));
    let x = Value::new(LoweringTracked {
        trace: trace.clone(),
        value: concrete.clone(),
    });

    let out = ctx.stop_gradient(&x).unwrap();

    assert_eq!(trace.inner.calls().len(), 1);
    assert_eq!(trace.inner.calls()[0].primitive, STOP_GRADIENT);
    assert_eq!(out, concrete);
    assert!(out.as_tracer().is_none());
}

#[test]
fn test_active_trace_surfaces_invalid_operand() {
    let ctx = AdContext::new();
    let trace = Arc::new(RecordingTrace::default());
    let x = track(&trace, Value::new("not an array".to_string()));

    let err = ctx.stop_gradient(&x).unwrap_err();

    assert_eq!(trace.calls().len(), 1);
    assert_eq!(
        err.to_string(),
        "stop_gradient only works on valid arrays, but input argument is: \"not an array\""
    );
}

#[test]
fn test_other_primitives_are_traced_normally() {
    let ctx = AdContext::new();
    let trace = Arc::new(RecordingTrace::default());
    let x = track(&trace, Value::new(Array::scalar(1.0)));

    ctx.zeros_like_jaxval(&x).unwrap();

    let calls = trace.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].primitive, "zeros_like");
}
