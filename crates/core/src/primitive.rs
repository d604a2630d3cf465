//! # Primitives
//!
//! A primitive is a named operation with pluggable rules:
//!
//! | Rule | Signature | Used by |
//! |------|-----------|---------|
//! | impl | values → value | evaluation when no trace is active |
//! | abstract eval | avals → aval | traces that only track shapes |
//! | shortcut | values → maybe value | checked before trace interception |
//!
//! [`Primitive::bind`] is the entry point. It first offers the arguments to
//! the shortcut rule, if any. A shortcut that answers `Some` ends the call.
//! Otherwise the standard path runs: if some argument belongs to an active
//! trace the trace processes the primitive and its output is fully lowered,
//! else the impl rule evaluates it directly.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::CoreError;
use crate::shape::Aval;
use crate::trace::{find_top_trace, full_lower};
use crate::value::Value;

/// Keyword parameters passed alongside primitive arguments.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Concrete evaluation rule.
pub type ImplRule = Arc<dyn Fn(&[Value], &Params) -> Result<Value, CoreError> + Send + Sync>;

/// Abstract evaluation rule.
pub type AbstractEvalRule = Arc<dyn Fn(&[Aval], &Params) -> Result<Aval, CoreError> + Send + Sync>;

/// Bind override checked before the standard path; `None` falls through.
pub type ShortcutRule =
    Arc<dyn Fn(&Primitive, &[Value], &Params) -> Option<Result<Value, CoreError>> + Send + Sync>;

/// A named polymorphic operation.
pub struct Primitive {
    name: &'static str,
    arity: usize,
    impl_rule: Option<ImplRule>,
    abstract_eval_rule: Option<AbstractEvalRule>,
    shortcut: Option<ShortcutRule>,
}

impl Primitive {
    /// Create a primitive taking `arity` positional arguments, with no rules.
    pub fn new(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            arity,
            impl_rule: None,
            abstract_eval_rule: None,
            shortcut: None,
        }
    }

    /// Set the concrete evaluation rule.
    pub fn def_impl<F>(mut self, rule: F) -> Self
    where
        F: Fn(&[Value], &Params) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        self.impl_rule = Some(Arc::new(rule));
        self
    }

    /// Set the abstract evaluation rule.
    pub fn def_abstract_eval<F>(mut self, rule: F) -> Self
    where
        F: Fn(&[Aval], &Params) -> Result<Aval, CoreError> + Send + Sync + 'static,
    {
        self.abstract_eval_rule = Some(Arc::new(rule));
        self
    }

    /// Set the bind shortcut.
    pub fn def_shortcut<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Primitive, &[Value], &Params) -> Option<Result<Value, CoreError>>
            + Send
            + Sync
            + 'static,
    {
        self.shortcut = Some(Arc::new(rule));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn has_shortcut(&self) -> bool {
        self.shortcut.is_some()
    }

    fn check_arity(&self, got: usize) -> Result<(), CoreError> {
        if got == self.arity {
            Ok(())
        } else {
            Err(CoreError::Arity {
                primitive: self.name,
                expected: self.arity,
                got,
            })
        }
    }

    /// Run the impl rule on concrete arguments.
    pub fn evaluate(&self, args: &[Value], params: &Params) -> Result<Value, CoreError> {
        self.check_arity(args.len())?;
        let rule = self.impl_rule.as_ref().ok_or(CoreError::MissingRule {
            primitive: self.name,
            rule: "impl",
        })?;
        rule(args, params)
    }

    /// Run the abstract evaluation rule on argument descriptors.
    pub fn abstract_eval(&self, avals: &[Aval], params: &Params) -> Result<Aval, CoreError> {
        self.check_arity(avals.len())?;
        let rule = self
            .abstract_eval_rule
            .as_ref()
            .ok_or(CoreError::MissingRule {
                primitive: self.name,
                rule: "abstract eval",
            })?;
        rule(avals, params)
    }

    /// Apply the primitive with no keyword parameters.
    pub fn bind(&self, args: &[Value]) -> Result<Value, CoreError> {
        self.bind_with_params(args, &Params::new())
    }

    /// Apply the primitive: shortcut first, then the standard path.
    pub fn bind_with_params(&self, args: &[Value], params: &Params) -> Result<Value, CoreError> {
        if let Some(shortcut) = &self.shortcut {
            if let Some(result) = shortcut(self, args, params) {
                return result;
            }
        }
        self.standard_bind(args, params)
    }

    /// Hand the primitive to the top trace among `args`, or evaluate it.
    pub fn standard_bind(&self, args: &[Value], params: &Params) -> Result<Value, CoreError> {
        self.check_arity(args.len())?;
        match find_top_trace(args) {
            Some(top) => {
                trace!(primitive = self.name, trace = top.name(), level = top.level(), "processing under trace");
                let out = top.process_primitive(self, args, params)?;
                Ok(full_lower(out))
            }
            None => self.evaluate(args, params),
        }
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("impl", &self.impl_rule.is_some())
            .field("abstract_eval", &self.abstract_eval_rule.is_some())
            .field("shortcut", &self.shortcut.is_some())
            .finish()
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
