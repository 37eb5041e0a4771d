//! # Error Handling
//!
//! Errors raised while configuring or running a partitioned aggregation.
//!
//! ## Taxonomy
//!
//! - **User function failures**: `fold`, `combine` or `project` returned an error. These are
//!   fatal to the component that owns the function (the partition for `fold`, the global
//!   aggregator for `combine`/`project`) and abort the run. Nothing is retried and no element
//!   is skipped, since skipping input would silently corrupt the aggregate.
//! - **Task failures**: a partition or aggregator task panicked.
//! - **Configuration errors**: rejected when the aggregator or operator is constructed,
//!   never deferred to run time.
//!
//! Running without a `combine` function is *not* an error: it selects pass-through mode.

use std::fmt;
use thiserror::Error;

/// Error type returned by user-supplied `fold`, `combine` and `project` functions.
pub type UserFunctionError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type AggregationResult<T> = Result<T, AggregationError>;

/// The user function that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  /// Partition-local fold of one element.
  Fold,
  /// Global combine of two states.
  Combine,
  /// Terminal projection of the global state.
  Project,
}

impl Stage {
  /// Returns a stable lowercase label, used for logs and metric labels.
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Fold => "fold",
      Stage::Combine => "combine",
      Stage::Project => "project",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Invalid operator or aggregator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
  /// A combine function is configured but the stream declares no partitions.
  #[error("combine requires at least one partition, but the stream declares a parallelism of 0")]
  ZeroPartitions,
  /// Channel capacity must be at least one.
  #[error("channel capacity must be >= 1")]
  ZeroChannelCapacity,
  /// Processing-time windows need a positive interval.
  #[error("processing-time interval must be > 0 ms")]
  ZeroInterval,
  /// The configuration document could not be parsed.
  #[error("failed to parse operator configuration: {0}")]
  Parse(String),
}

/// Fatal failure of an aggregation run.
#[derive(Debug, Error)]
pub enum AggregationError {
  /// A user-supplied function returned an error.
  #[error("{stage} function failed{}: {source}", partition_suffix(.partition))]
  UserFunction {
    /// Which function failed.
    stage: Stage,
    /// Partition that owned the failing fold, `None` for the global stage.
    partition: Option<usize>,
    /// The error returned by the user function.
    #[source]
    source: UserFunctionError,
  },
  /// A partition task panicked.
  #[error("partition {partition} panicked: {message}")]
  PartitionPanicked {
    /// Index of the partition.
    partition: usize,
    /// Panic payload, when it was a string.
    message: String,
  },
  /// The global aggregator task panicked.
  #[error("global aggregator panicked: {message}")]
  AggregatorPanicked {
    /// Panic payload, when it was a string.
    message: String,
  },
  /// Invalid configuration.
  #[error(transparent)]
  Configuration(#[from] ConfigurationError),
}

impl AggregationError {
  /// Wraps a failure of a partition's fold function.
  pub fn fold(partition: usize, source: UserFunctionError) -> Self {
    AggregationError::UserFunction {
      stage: Stage::Fold,
      partition: Some(partition),
      source,
    }
  }

  /// Wraps a failure of the global combine function.
  pub fn combine(source: UserFunctionError) -> Self {
    AggregationError::UserFunction {
      stage: Stage::Combine,
      partition: None,
      source,
    }
  }

  /// Wraps a failure of the projection function.
  pub fn project(source: UserFunctionError) -> Self {
    AggregationError::UserFunction {
      stage: Stage::Project,
      partition: None,
      source,
    }
  }

  /// Returns the failing stage for user function failures.
  pub fn stage(&self) -> Option<Stage> {
    match self {
      AggregationError::UserFunction { stage, .. } => Some(*stage),
      _ => None,
    }
  }

  /// Returns true for configuration errors.
  pub fn is_configuration(&self) -> bool {
    matches!(self, AggregationError::Configuration(_))
  }
}

fn partition_suffix(partition: &Option<usize>) -> String {
  partition
    .map(|p| format!(" in partition {}", p))
    .unwrap_or_default()
}

/// Renders a task panic payload as text.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
  if let Some(s) = payload.downcast_ref::<&'static str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "non-string panic payload".to_string()
  }
}
