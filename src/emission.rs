//! # Emission Policies
//!
//! Decides when a partition emits its local state to the global aggregator. This is the
//! slicing collaborator of the protocol: the aggregator itself is agnostic to the choice,
//! but its barrier assumes every partition emits exactly one contribution per round.
//!
//! | Policy           | Emits                                    | Resets local state |
//! |------------------|------------------------------------------|--------------------|
//! | `EveryElement`   | after every folded element               | never              |
//! | `CountWindow`    | after every `size` elements              | after each window  |
//! | `ProcessingTime` | on every interval tick (even if empty)   | after each tick    |
//! | `EndOfStream`    | once, when the partition input ends      | n/a                |
//!
//! Count and processing-time windows flush a non-empty trailing window when the input ends.
//!
//! Policies deserialize from a tagged representation:
//!
//! ```rust
//! use streamweave_aggregation::emission::EmissionPolicy;
//!
//! let policy: EmissionPolicy =
//!   serde_json::from_str(r#"{ "kind": "count_window", "size": 100 }"#).unwrap();
//! assert_eq!(policy, EmissionPolicy::count_window(100).unwrap());
//! ```

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

/// When a partition emits its running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmissionPolicy {
  /// Emit the running state after every element.
  ///
  /// Each emission carries the partition's cumulative fold, so a non-idempotent combine
  /// (such as a sum) over-counts across rounds, while an idempotent combine (set union,
  /// union-find merge) does not.
  #[default]
  EveryElement,
  /// Tumbling count windows of `size` elements.
  CountWindow {
    /// Elements per window.
    size: NonZeroUsize,
  },
  /// Tumbling processing-time windows.
  ProcessingTime {
    /// Window length in milliseconds.
    interval_ms: u64,
  },
  /// Emit once, when the partition input is exhausted.
  EndOfStream,
}

impl EmissionPolicy {
  /// Tumbling count windows. Returns `None` for a size of zero.
  pub fn count_window(size: usize) -> Option<Self> {
    NonZeroUsize::new(size).map(|size| EmissionPolicy::CountWindow { size })
  }

  /// Tumbling processing-time windows of the given length.
  pub fn processing_time(interval: Duration) -> Self {
    EmissionPolicy::ProcessingTime {
      interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
    }
  }

  /// Returns the tick interval for processing-time windows.
  pub fn interval(&self) -> Option<Duration> {
    match self {
      EmissionPolicy::ProcessingTime { interval_ms } => Some(Duration::from_millis(*interval_ms)),
      _ => None,
    }
  }

  /// Checks the policy parameters.
  pub fn validate(&self) -> Result<(), ConfigurationError> {
    match self {
      EmissionPolicy::ProcessingTime { interval_ms: 0 } => Err(ConfigurationError::ZeroInterval),
      _ => Ok(()),
    }
  }

  /// Returns true if a window boundary resets the local state.
  pub fn is_windowed(&self) -> bool {
    matches!(
      self,
      EmissionPolicy::CountWindow { .. } | EmissionPolicy::ProcessingTime { .. }
    )
  }
}

/// Outcome of feeding one element to an [`EmissionTrigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerResult {
  /// Keep accumulating.
  Continue,
  /// Emit the state and keep it.
  Fire,
  /// Emit the state and reset it to the initial value.
  FireAndPurge,
}

/// Per-partition element counter that applies an [`EmissionPolicy`].
#[derive(Debug, Clone)]
pub(crate) struct EmissionTrigger {
  policy: EmissionPolicy,
  pending: usize,
}

impl EmissionTrigger {
  pub(crate) fn new(policy: EmissionPolicy) -> Self {
    Self { policy, pending: 0 }
  }

  pub(crate) fn policy(&self) -> EmissionPolicy {
    self.policy
  }

  /// Number of elements folded since the last emission that reset the state.
  #[cfg(test)]
  pub(crate) fn pending(&self) -> usize {
    self.pending
  }

  pub(crate) fn on_element(&mut self) -> TriggerResult {
    self.pending += 1;
    match self.policy {
      EmissionPolicy::EveryElement => {
        self.pending = 0;
        TriggerResult::Fire
      }
      EmissionPolicy::CountWindow { size } if self.pending >= size.get() => {
        self.pending = 0;
        TriggerResult::FireAndPurge
      }
      _ => TriggerResult::Continue,
    }
  }

  /// Called on a processing-time tick or an external window boundary.
  pub(crate) fn on_boundary(&mut self) {
    self.pending = 0;
  }

  /// Whether the end of input should produce a final emission.
  pub(crate) fn on_end(&self) -> bool {
    match self.policy {
      EmissionPolicy::EveryElement => false,
      EmissionPolicy::CountWindow { .. } | EmissionPolicy::ProcessingTime { .. } => {
        self.pending > 0
      }
      EmissionPolicy::EndOfStream => true,
    }
  }
}
