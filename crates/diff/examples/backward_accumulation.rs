//! Cotangent accumulation with symbolic zeros
//!
//! Run with: RUST_LOG=debug cargo run -p zeroad-diff --example backward_accumulation
//!
//! This example demonstrates:
//! - Summing cotangents that reach a variable along several paths
//! - Keeping zeros symbolic until a concrete value is needed
//! - Plugging in a new value type through the registries
//! - Stop-gradient outside of any trace

use std::fmt;

use zeroad_core::{AbstractValue, Aval, CoreError, JaxVal, Shape, Value};
use zeroad_diff::{AdContext, Array, Cotangent, CotangentAccumulator, ZERO};

/// A count with its own descriptor.
#[derive(Debug, Clone, PartialEq)]
struct Count(u32);

#[derive(Debug, Clone, PartialEq)]
struct CountAval;

impl fmt::Display for CountAval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "count")
    }
}

impl AbstractValue for CountAval {
    fn join(&self, other: &Aval) -> Result<Aval, CoreError> {
        match other.downcast_ref::<CountAval>() {
            Some(_) => Ok(Aval::new(CountAval)),
            None => Err(CoreError::JoinUndefined {
                left: self.to_string(),
                right: other.to_string(),
            }),
        }
    }
}

impl JaxVal for Count {
    fn aval(&self) -> Result<Aval, CoreError> {
        Ok(Aval::new(CountAval))
    }
}

fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Cotangent Accumulation ===\n");

    let ctx = AdContext::global();

    // -------------------------------------------------------------------------
    // 1. Fan-out: x is used by three consumers
    // -------------------------------------------------------------------------
    println!("1. Fan-out");
    println!("----------");

    let mut acc = CotangentAccumulator::new(ctx);
    acc.accumulate("x", Value::new(Array::vector(vec![1.0, 0.5])))?;
    acc.accumulate("x", ZERO)?;
    acc.accumulate("x", Value::new(Array::vector(vec![2.0, 2.0])))?;
    println!("ct[x] = {}", acc.read(&"x"));

    // -------------------------------------------------------------------------
    // 2. Unused variable: stays Zero until instantiated
    // -------------------------------------------------------------------------
    println!("\n2. Unused variable");
    println!("------------------");

    println!("ct[y] = {}", acc.read(&"y"));
    let y = acc.read_instantiated(&"y", &Aval::new(Shape::f32_vector(2)))?;
    println!("instantiated ct[y] = {:?}", y);

    // -------------------------------------------------------------------------
    // 3. A new value type
    // -------------------------------------------------------------------------
    println!("\n3. Registering Count");
    println!("--------------------");

    ctx.register_adder(|a: &Count, b: &Count| Ok(Count(a.0 + b.0)));
    ctx.register_zeros_like_aval(|_: &CountAval| Count(0));

    let sum = ctx.add_cotangents(
        Cotangent::Value(Value::new(Count(3))),
        Cotangent::Value(Value::new(Count(4))),
    )?;
    println!("Count(3) + Count(4) = {}", sum);
    println!("zeros_like_aval(count) = {:?}", ctx.zeros_like_aval(&Aval::new(CountAval))?);

    // -------------------------------------------------------------------------
    // 4. Stop-gradient with nothing tracing
    // -------------------------------------------------------------------------
    println!("\n4. Stop-gradient");
    println!("----------------");

    let w = Value::new(Array::scalar(0.25));
    let stopped = ctx.stop_gradient(&w)?;
    println!("stop_gradient(w) is w: {}", stopped.ptr_eq(&w));

    Ok(())
}
