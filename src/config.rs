//! Operator configuration.
//!
//! [`OperatorConfig`] holds the runtime settings of an [`AggregationOperator`]: its name
//! (used in logs and metric labels), the capacity of the bounded channels between tasks and
//! the partition emission policy. The user functions live in the
//! [`AggregationSpec`](crate::aggregation::AggregationSpec), not here.
//!
//! Configuration can be built in code or loaded from JSON; missing fields take defaults:
//!
//! ```rust
//! use streamweave_aggregation::config::OperatorConfig;
//!
//! let config = OperatorConfig::from_json(
//!   r#"{ "name": "degrees", "emission": { "kind": "processing_time", "interval_ms": 500 } }"#,
//! )
//! .unwrap();
//! assert_eq!(config.name, "degrees");
//! assert_eq!(config.channel_capacity, 64);
//! ```
//!
//! [`AggregationOperator`]: crate::operator::AggregationOperator

use crate::emission::EmissionPolicy;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Default capacity of the contribution and output channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default operator name.
pub const DEFAULT_OPERATOR_NAME: &str = "aggregation";

/// Runtime settings of an aggregation operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
  /// Operator name, used in tracing spans and metric labels.
  pub name: String,
  /// Capacity of each bounded channel between tasks.
  pub channel_capacity: usize,
  /// When partitions emit their local state.
  pub emission: EmissionPolicy,
}

impl Default for OperatorConfig {
  fn default() -> Self {
    Self {
      name: DEFAULT_OPERATOR_NAME.to_string(),
      channel_capacity: DEFAULT_CHANNEL_CAPACITY,
      emission: EmissionPolicy::default(),
    }
  }
}

impl OperatorConfig {
  /// Creates a default configuration with the given operator name.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Sets the channel capacity.
  pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
    self.channel_capacity = capacity;
    self
  }

  /// Sets the emission policy.
  pub fn with_emission(mut self, emission: EmissionPolicy) -> Self {
    self.emission = emission;
    self
  }

  /// Parses and validates a JSON configuration document.
  pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
    let config: Self =
      serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Checks that the settings are usable.
  pub fn validate(&self) -> Result<(), ConfigurationError> {
    if self.channel_capacity == 0 {
      return Err(ConfigurationError::ZeroChannelCapacity);
    }
    self.emission.validate()
  }
}
