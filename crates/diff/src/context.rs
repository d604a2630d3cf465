//! # AD Context
//!
//! [`AdContext`] owns everything the additive machinery shares: the handler
//! registries, the tree registry and the three primitives. The primitives
//! capture `Arc` handles to the registries, so types registered after start-up
//! are visible to later binds.
//!
//! Start-up registers, in order:
//!
//! 1. the no-data entries: `Unit` adder, `AbstractUnit` and `Unit` zeros
//! 2. the dense [`Array`] adder and zero constructors
//! 3. [`Zero`](crate::zero::Zero) and [`Cotangent`](crate::zero::Cotangent)
//!    as tree nodes
//!
//! Most programs use the process-wide [`AdContext::global`]. Tests and hosts
//! that need a different [`AdConfig`] build their own.

use std::sync::{Arc, OnceLock};

use tracing::debug;
use zeroad_core::{AbstractUnit, Primitive, TreeRegistry, Unit};

use crate::add::{build_add_any, AdderRegistry, ADD_JAXVALS};
use crate::array::Array;
use crate::config::AdConfig;
use crate::stop_gradient::build_stop_gradient;
use crate::zero::register_tree_nodes;
use crate::zeros::{
    build_zeros_like, AvalZerosLikeRegistry, ZerosLikeRegistry, ZEROS_LIKE_AVAL, ZEROS_LIKE_JAXVAL,
};

static GLOBAL: OnceLock<AdContext> = OnceLock::new();

/// Registries and primitives for additive combination, zero construction
/// and stop-gradient.
#[derive(Debug)]
pub struct AdContext {
    config: AdConfig,
    pub(crate) adders: Arc<AdderRegistry>,
    pub(crate) jaxval_zeros: Arc<ZerosLikeRegistry>,
    pub(crate) aval_zeros: Arc<AvalZerosLikeRegistry>,
    trees: TreeRegistry,
    pub(crate) add_jaxvals_p: Primitive,
    pub(crate) zeros_like_p: Primitive,
    pub(crate) stop_gradient_p: Primitive,
}

impl AdContext {
    /// A context with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AdConfig::default())
    }

    pub fn with_config(config: AdConfig) -> Self {
        let adders = Arc::new(AdderRegistry::new(ADD_JAXVALS));
        let jaxval_zeros = Arc::new(ZerosLikeRegistry::new(ZEROS_LIKE_JAXVAL));
        let aval_zeros = Arc::new(AvalZerosLikeRegistry::new(ZEROS_LIKE_AVAL));

        let ctx = Self {
            add_jaxvals_p: build_add_any(adders.clone(), &config),
            zeros_like_p: build_zeros_like(jaxval_zeros.clone(), &config),
            stop_gradient_p: build_stop_gradient(),
            config,
            adders,
            jaxval_zeros,
            aval_zeros,
            trees: TreeRegistry::new(),
        };
        ctx.register_builtins();
        debug!(
            adders = ctx.adders.len(),
            zeros_like_jaxval = ctx.jaxval_zeros.len(),
            zeros_like_aval = ctx.aval_zeros.len(),
            tree_nodes = ctx.trees.len(),
            "AdContext ready"
        );
        ctx
    }

    fn register_builtins(&self) {
        self.register_adder::<Unit, _>(|_, _| Ok(Unit));
        self.register_zeros_like_aval::<AbstractUnit, Unit, _>(|_| Unit);
        self.register_zeros_like_jaxval::<Unit, _>(|_| Ok(Unit));

        self.register_combinable::<Array>();
        self.register_zero_constructible::<Array>();

        register_tree_nodes(&self.trees);
    }

    /// The process-wide context, built on first use.
    pub fn global() -> &'static AdContext {
        GLOBAL.get_or_init(AdContext::new)
    }

    pub fn config(&self) -> &AdConfig {
        &self.config
    }

    /// Tree registry holding the symbolic zero and cotangent nodes.
    pub fn trees(&self) -> &TreeRegistry {
        &self.trees
    }

    pub fn add_any_primitive(&self) -> &Primitive {
        &self.add_jaxvals_p
    }

    pub fn zeros_like_primitive(&self) -> &Primitive {
        &self.zeros_like_p
    }

    pub fn stop_gradient_primitive(&self) -> &Primitive {
        &self.stop_gradient_p
    }
}

impl Default for AdContext {
    fn default() -> Self {
        Self::new()
    }
}
