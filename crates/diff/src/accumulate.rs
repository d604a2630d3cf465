//! # Cotangent Accumulation
//!
//! A reverse pass walks the program backwards and sums the cotangents that
//! reach each variable from its consumers. Symbolic zeros are kept symbolic
//! for as long as possible:
//!
//! | Existing | Incoming | Stored |
//! |----------|----------|--------|
//! | none / `Zero` | any | incoming |
//! | `Value(a)` | `Zero` | `Value(a)` |
//! | `Value(a)` | `Value(b)` | `add_jaxvals(a, b)` |
//!
//! A zero is only materialized when a caller asks for a concrete value via
//! [`CotangentAccumulator::read_instantiated`].

use std::collections::HashMap;
use std::hash::Hash;

use zeroad_core::{Aval, CoreError, Value};

use crate::context::AdContext;
use crate::zero::Cotangent;

impl AdContext {
    /// Sum two cotangents, keeping zeros symbolic.
    pub fn add_cotangents(&self, a: Cotangent, b: Cotangent) -> Result<Cotangent, CoreError> {
        match (a, b) {
            (Cotangent::Zero, ct) | (ct, Cotangent::Zero) => Ok(ct),
            (Cotangent::Value(x), Cotangent::Value(y)) => {
                Ok(Cotangent::Value(self.add_jaxvals(&x, &y)?))
            }
        }
    }

    /// A concrete value for `ct`, building the zero for `aval` if needed.
    pub fn instantiate_zeros(&self, aval: &Aval, ct: Cotangent) -> Result<Value, CoreError> {
        match ct {
            Cotangent::Zero => self.zeros_like_aval(aval),
            Cotangent::Value(value) => Ok(value),
        }
    }
}

/// Per-variable cotangent sums for one backward pass.
#[derive(Debug)]
pub struct CotangentAccumulator<'a, K = usize> {
    ctx: &'a AdContext,
    cts: HashMap<K, Cotangent>,
}

impl<'a, K: Eq + Hash> CotangentAccumulator<'a, K> {
    pub fn new(ctx: &'a AdContext) -> Self {
        Self {
            ctx,
            cts: HashMap::new(),
        }
    }

    /// Add `ct` into the cotangent for `var`.
    pub fn accumulate(&mut self, var: K, ct: impl Into<Cotangent>) -> Result<(), CoreError> {
        let ct = ct.into();
        if ct.is_zero() {
            return Ok(());
        }
        let sum = match self.cts.get(&var) {
            Some(existing) => self.ctx.add_cotangents(existing.clone(), ct)?,
            None => ct,
        };
        self.cts.insert(var, sum);
        Ok(())
    }

    /// The cotangent for `var`, `Zero` if nothing reached it.
    pub fn read(&self, var: &K) -> Cotangent {
        self.cts.get(var).cloned().unwrap_or_default()
    }

    pub fn read_instantiated(&self, var: &K, aval: &Aval) -> Result<Value, CoreError> {
        self.ctx.instantiate_zeros(aval, self.read(var))
    }

    /// Remove and return the cotangent for `var`.
    pub fn take(&mut self, var: &K) -> Cotangent {
        self.cts.remove(var).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cts.is_empty()
    }
}
