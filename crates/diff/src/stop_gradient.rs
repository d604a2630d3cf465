//! # Stop-Gradient
//!
//! `stop_gradient(x)` evaluates to `x`. Its point is the derivative rule a
//! differentiation trace attaches to it, so the primitive must reach such a
//! trace when one is active, but must not leave an identity node behind in a
//! staged program when nothing is tracking `x`.
//!
//! The primitive therefore carries a bind shortcut:
//!
//! - no trace is tracking `x`: return `x` at once, skipping the standard path
//! - a trace is active: fall through, so the trace's `process_primitive` sees
//!   the primitive with `x` as its only argument and no parameters, and the
//!   resulting tracer is fully lowered

use tracing::debug;
use zeroad_core::{find_top_trace, CoreError, Primitive, Value};

use crate::context::AdContext;

/// Name of the stop-gradient primitive.
pub const STOP_GRADIENT: &str = "stop_gradient";

pub(crate) fn build_stop_gradient() -> Primitive {
    Primitive::new(STOP_GRADIENT, 1)
        .def_impl(|args, _| {
            let x = &args[0];
            if !x.is_valid() {
                return Err(CoreError::InvalidOperand {
                    primitive: STOP_GRADIENT,
                    value: format!("{:?}", x),
                });
            }
            Ok(x.clone())
        })
        .def_abstract_eval(|avals, _| Ok(avals[0].clone()))
        .def_shortcut(|_, args, _| {
            // Arity errors are reported by the standard path.
            let [x] = args else {
                return None;
            };
            match find_top_trace(args) {
                Some(top) => {
                    debug!(trace = top.name(), level = top.level(), "stop_gradient under trace");
                    None
                }
                None => {
                    debug!(type_name = x.type_name(), "stop_gradient without trace");
                    Some(Ok(x.clone()))
                }
            }
        })
}

impl AdContext {
    /// Block gradient flow through `x`.
    pub fn stop_gradient(&self, x: &Value) -> Result<Value, CoreError> {
        self.stop_gradient_p.bind(std::slice::from_ref(x))
    }
}
