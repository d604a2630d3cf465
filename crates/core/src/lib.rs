//! # Core - Interpreter Foundations for Tracing Autodiff
//!
//! This crate provides the pieces a tracing interpreter is built from:
//!
//! - **Shapes**: Abstract values and their lattice join
//! - **Values**: Open, type-erased concrete values
//! - **Registries**: Type-keyed handler tables for extensible dispatch
//! - **Trees**: Flatten/unflatten of structured values into leaves
//! - **Traces**: Interpreters that intercept primitive applications
//! - **Primitives**: Named operations with impl, abstract-eval and bind rules
//! - **Errors**: One error type for every layer above
//!
//! ## Design Philosophy
//!
//! Operations are values. A primitive carries its own evaluation rules, and
//! whether it is evaluated, staged or differentiated depends only on which
//! trace (if any) owns its arguments at bind time.

pub mod error;
pub mod primitive;
pub mod registry;
pub mod shape;
pub mod trace;
pub mod tree;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::CoreError;
pub use primitive::{Params, Primitive};
pub use registry::{AsAny, TypeKey, TypeRegistry};
pub use shape::{lattice_join, AbstractUnit, AbstractValue, Aval, DType, Shape};
pub use trace::{find_top_trace, full_lower, Trace, Tracer};
pub use tree::{TreeDef, TreeRegistry};
pub use value::{get_aval, valid_jaxtype, JaxVal, Unit, Value};
