//! # Traces and Tracers
//!
//! A trace intercepts primitive applications to implement a program
//! transformation (differentiation, staging for compilation, batching).
//! Values being tracked by a trace are wrapped in tracers; a primitive bound
//! on tracer arguments is handed to the trace instead of being evaluated.
//!
//! Traces nest. Each has a level, and when arguments carry tracers from
//! several traces the highest level wins ([`find_top_trace`]). After a trace
//! produces an output tracer, [`full_lower`] strips wrapper layers that are
//! no longer needed.

use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;
use crate::primitive::{Params, Primitive};
use crate::value::{JaxVal, Value};

/// An interpreter that intercepts primitive applications.
pub trait Trace: fmt::Debug + Send + Sync {
    /// Nesting level; higher levels are closer to the user.
    fn level(&self) -> usize;

    fn name(&self) -> &str {
        "trace"
    }

    /// Apply `primitive` to `args` under this trace, returning an output
    /// tracer wrapped as a `Value`.
    fn process_primitive(
        &self,
        primitive: &Primitive,
        args: &[Value],
        params: &Params,
    ) -> Result<Value, CoreError>;
}

/// A value tracked by a trace.
pub trait Tracer: JaxVal {
    fn trace(&self) -> Arc<dyn Trace>;

    /// The least-abstracted representation of this tracer. Tracers that carry
    /// no information beyond a known value return that value.
    fn full_lower(&self) -> Value;
}

/// The active trace with the highest level among `args`, if any.
pub fn find_top_trace(args: &[Value]) -> Option<Arc<dyn Trace>> {
    args.iter()
        .filter_map(|arg| arg.as_tracer().map(|tracer| tracer.trace()))
        .max_by_key(|trace| trace.level())
}

/// Lower a tracer to its simplest representation; non-tracers pass through.
pub fn full_lower(value: Value) -> Value {
    if let Some(lowered) = value.as_tracer().map(|tracer| tracer.full_lower()) {
        return lowered;
    }
    value
}
