//! # Diff - Additive Machinery for Reverse-Mode Autodiff
//!
//! A backward pass needs three things from the value layer that no single
//! value type can provide on its own:
//!
//! - **Adding** two cotangents of the same abstract type ([`add`])
//! - **Zeros** of a given type or descriptor ([`zeros`])
//! - A **symbolic zero** that stands in for a zero without allocating one
//!   ([`zero`])
//!
//! All three dispatch through type-keyed registries owned by an
//! [`AdContext`], so new array types plug in by registering handlers. The
//! context also owns [`stop_gradient`], an identity primitive that only
//! becomes visible to traces that are actually tracking its argument.
//!
//! ## Modules
//!
//! - [`array`]: Dense f32 arrays, registered at start-up
//! - [`add`]: `add_jaxvals` and the `add_any` primitive
//! - [`zeros`]: `zeros_like_jaxval` (traced) and `zeros_like_aval` (eager)
//! - [`zero`]: `Zero`, `Cotangent` and their tree registration
//! - [`stop_gradient`]: Identity with a no-trace bind shortcut
//! - [`accumulate`]: Summing cotangents per variable
//! - [`context`]: Registries, primitives and the global instance
//! - [`config`]: Operand-type policy and dispatch logging
//!
//! ## Example
//!
//! ```rust
//! use zeroad_core::{Aval, Shape, Value};
//! use zeroad_diff::{AdContext, Array, Cotangent};
//!
//! let ctx = AdContext::global();
//!
//! let x = Value::new(Array::vector(vec![1.0, 2.0]));
//! let y = Value::new(Array::vector(vec![3.0, 4.0]));
//! assert_eq!(ctx.add_jaxvals(&x, &y).unwrap(), Value::new(Array::vector(vec![4.0, 6.0])));
//!
//! let aval = Aval::new(Shape::f32_vector(2));
//! let zero = ctx.instantiate_zeros(&aval, Cotangent::Zero).unwrap();
//! assert_eq!(zero, Value::new(Array::zeros(Shape::f32_vector(2))));
//! ```

pub mod accumulate;
pub mod add;
pub mod array;
pub mod config;
pub mod context;
pub mod stop_gradient;
pub mod zero;
pub mod zeros;

// Re-export key types
pub use accumulate::CotangentAccumulator;
pub use add::{Adder, AdderRegistry, Combinable, ADD_ANY, ADD_JAXVALS};
pub use array::Array;
pub use config::{AdConfig, OperandTypePolicy};
pub use context::AdContext;
pub use stop_gradient::STOP_GRADIENT;
pub use zero::{register_tree_nodes, Cotangent, Zero, ZERO};
pub use zeros::{
    AvalZerosLiker, AvalZerosLikeRegistry, ZeroConstructible, ZerosLikeRegistry, ZerosLiker,
    ZEROS_LIKE, ZEROS_LIKE_AVAL, ZEROS_LIKE_JAXVAL,
};
