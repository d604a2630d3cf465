//! Context configuration.
//!
//! ```
//! use zeroad_diff::config::{AdConfig, OperandTypePolicy};
//!
//! let config = AdConfig::from_json(r#"{ "operand_types": "first_operand" }"#).unwrap();
//! assert_eq!(config.operand_types, OperandTypePolicy::FirstOperand);
//! assert!(config.log_dispatch);
//! ```

use serde::{Deserialize, Serialize};
use zeroad_core::CoreError;

/// How additive combination treats operands of different concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandTypePolicy {
    /// Reject operands whose concrete types differ.
    #[default]
    Strict,
    /// Dispatch on the first operand's type and hand both to its adder.
    FirstOperand,
}

/// Settings for an `AdContext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdConfig {
    pub operand_types: OperandTypePolicy,
    /// Emit a `trace!` event for every registry dispatch.
    pub log_dispatch: bool,
}

impl Default for AdConfig {
    fn default() -> Self {
        Self {
            operand_types: OperandTypePolicy::Strict,
            log_dispatch: true,
        }
    }
}

impl AdConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::Config {
            reason: e.to_string(),
        })
    }

    pub fn with_operand_types(mut self, policy: OperandTypePolicy) -> Self {
        self.operand_types = policy;
        self
    }

    pub fn with_log_dispatch(mut self, enabled: bool) -> Self {
        self.log_dispatch = enabled;
        self
    }
}
