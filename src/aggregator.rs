//! # Global Aggregator
//!
//! Combines the partition-state contributions of all partitions into one global state.
//!
//! ## State Machine
//!
//! The aggregator owns two variables: `current` (starts at the initial state) and
//! `remaining` (starts at the partition count `P`). For each contribution `s`:
//!
//! 1. Without a combine function, `s` is emitted at once (through the projection, which is
//!    the identity when none is configured). Nothing else changes.
//! 2. Otherwise:
//!    1. `current = combine(current, s)`
//!    2. `remaining -= 1`
//!    3. when `remaining` reaches 0, `project(current)` is emitted and `remaining = P`
//!    4. if the spec is transient, `current` is reset to the initial state, whether or
//!       not step 3 fired.
//!
//! Step 4 runs after *every* contribution. With `transient = true` and `P > 1`, all
//! contributions of a round except the last are combined into a value that is immediately
//! discarded, so each emitted round equals `combine(initial, last contribution)`.
//!
//! The barrier is a count: a partition that emits twice before another emits once
//! completes the round early. Callers must ensure every partition contributes exactly
//! once per round.
//!
//! The aggregator is a plain owned value. The operator moves it into a single task that
//! consumes one channel, so contributions are applied strictly one at a time.

use crate::aggregation::{AggregationMode, AggregationSpec, CombineFn, ProjectFn};
use crate::error::{AggregationError, AggregationResult, ConfigurationError};
use futures::{Stream, StreamExt};
use tracing::{debug, trace, warn};

/// Barrier-based combiner of partition contributions.
pub struct GlobalAggregator<S, T> {
  combine: Option<CombineFn<S>>,
  project: ProjectFn<S, T>,
  initial: S,
  mode: AggregationMode,
  parallelism: usize,
  current: S,
  remaining: usize,
  rounds: u64,
}

impl<S, T> GlobalAggregator<S, T>
where
  S: Clone + Send + Sync + 'static,
  T: Send + 'static,
{
  /// Creates the aggregator for a stream of `parallelism` partitions.
  ///
  /// # Errors
  ///
  /// [`ConfigurationError::ZeroPartitions`] when the spec has a combine function and
  /// `parallelism` is 0: such a barrier could never fire.
  pub fn new<E>(
    spec: &AggregationSpec<E, S, T>,
    parallelism: usize,
  ) -> Result<Self, ConfigurationError> {
    if spec.has_combine() && parallelism == 0 {
      return Err(ConfigurationError::ZeroPartitions);
    }
    Ok(Self {
      combine: spec.combine_fn().cloned(),
      project: spec.project_fn().clone(),
      initial: spec.initial().clone(),
      mode: spec.mode(),
      parallelism,
      current: spec.initial().clone(),
      remaining: parallelism,
      rounds: 0,
    })
  }

  /// Returns the aggregation mode.
  pub fn mode(&self) -> AggregationMode {
    self.mode
  }

  /// Returns the partition count the barrier waits for.
  pub fn parallelism(&self) -> usize {
    self.parallelism
  }

  /// Returns the retained global state.
  pub fn current(&self) -> &S {
    &self.current
  }

  /// Returns the number of contributions still needed to complete the round.
  pub fn remaining(&self) -> usize {
    self.remaining
  }

  /// Returns the number of completed barrier rounds.
  pub fn rounds(&self) -> u64 {
    self.rounds
  }

  /// Applies one contribution, returning the output it produces, if any.
  ///
  /// # Errors
  ///
  /// A failing combine or projection. The error is fatal: the aggregator must not be fed
  /// further contributions.
  pub fn accept(&mut self, contribution: S) -> AggregationResult<Option<T>> {
    let Some(combine) = self.combine.as_ref() else {
      debug!("forwarding contribution");
      return (self.project)(contribution)
        .map(Some)
        .map_err(AggregationError::project);
    };

    let current = std::mem::replace(&mut self.current, self.initial.clone());
    self.current = combine(current, contribution).map_err(AggregationError::combine)?;
    self.remaining -= 1;
    trace!(remaining = self.remaining, "combined contribution");

    let output = if self.remaining == 0 {
      self.remaining = self.parallelism;
      self.rounds += 1;
      debug!(round = self.rounds, "barrier complete");
      Some((self.project)(self.current.clone()).map_err(AggregationError::project)?)
    } else {
      None
    };

    if self.mode == AggregationMode::Transient {
      self.current = self.initial.clone();
    }

    Ok(output)
  }

  /// Turns a stream of contributions into the output stream.
  ///
  /// The output ends after the first error, whether it came from the input or from
  /// [`accept`](Self::accept). An incomplete trailing round is dropped when the input ends.
  pub fn aggregate<St>(mut self, contributions: St) -> impl Stream<Item = AggregationResult<T>> + Send
  where
    St: Stream<Item = AggregationResult<S>> + Send + 'static,
  {
    async_stream::stream! {
      let mut contributions = Box::pin(contributions);
      while let Some(next) = contributions.next().await {
        match next.and_then(|state| self.accept(state)) {
          Ok(Some(output)) => yield Ok(output),
          Ok(None) => {}
          Err(e) => {
            yield Err(e);
            return;
          }
        }
      }
      if self.mode.is_barrier() && self.remaining != self.parallelism {
        warn!(
          received = self.parallelism - self.remaining,
          expected = self.parallelism,
          "input ended with an incomplete round"
        );
      }
    }
  }
}
