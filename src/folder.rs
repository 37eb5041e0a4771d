//! # Partition Folder
//!
//! Folds the elements of one partition into a partition-local aggregate state and emits
//! that state to the global aggregator according to the [`EmissionPolicy`].
//!
//! Each partition owns its folder exclusively: no state is shared between partitions, and
//! a folder never waits on another partition. Whatever a folder emits is the running fold
//! of its elements since the last window reset (or since partition start).
//!
//! The synchronous methods ([`PartitionFolder::fold`], [`PartitionFolder::window_boundary`],
//! [`PartitionFolder::finish`]) implement the protocol; [`PartitionFolder::run`] is the task
//! body the operator spawns per partition.

use crate::aggregation::{AggregationSpec, FoldFn};
use crate::emission::{EmissionPolicy, EmissionTrigger, TriggerResult};
use crate::error::{AggregationError, AggregationResult};
use crate::metrics;
use crate::partitioning::ElementStream;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, trace};

/// One partition-state emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution<S> {
  /// Index of the emitting partition. Informational only: the barrier counts
  /// contributions without looking at their origin.
  pub partition: usize,
  /// The partition-local state at emission time.
  pub state: S,
}

/// Destination of partition contributions.
///
/// Implemented for the operator's `mpsc` channel; other transports can be plugged in by
/// implementing this trait.
#[async_trait]
pub trait ContributionSink<S>: Send + Sync {
  /// Delivers one contribution. Returns `false` once the receiver is gone.
  async fn deliver(&self, contribution: Contribution<S>) -> bool;
}

#[async_trait]
impl<S: Send + 'static> ContributionSink<S>
  for mpsc::Sender<AggregationResult<Contribution<S>>>
{
  async fn deliver(&self, contribution: Contribution<S>) -> bool {
    self.send(Ok(contribution)).await.is_ok()
  }
}

/// Partition-local fold state machine.
pub struct PartitionFolder<E, S> {
  partition: usize,
  fold: FoldFn<E, S>,
  initial: S,
  state: S,
  trigger: EmissionTrigger,
  folded: u64,
  operator: String,
}

impl<E, S> PartitionFolder<E, S>
where
  E: Send + 'static,
  S: Clone + Send + Sync + 'static,
{
  /// Creates the folder of `partition`, seeded with the spec's initial state.
  pub fn new<T>(partition: usize, spec: &AggregationSpec<E, S, T>, emission: EmissionPolicy) -> Self {
    Self {
      partition,
      fold: spec.fold_fn().clone(),
      initial: spec.initial().clone(),
      state: spec.initial().clone(),
      trigger: EmissionTrigger::new(emission),
      folded: 0,
      operator: crate::config::DEFAULT_OPERATOR_NAME.to_string(),
    }
  }

  /// Sets the operator name used in logs and metric labels.
  pub fn with_operator_name(mut self, name: impl Into<String>) -> Self {
    self.operator = name.into();
    self
  }

  /// Returns the partition index.
  pub fn partition(&self) -> usize {
    self.partition
  }

  /// Returns the current local state.
  pub fn state(&self) -> &S {
    &self.state
  }

  /// Returns the number of elements folded so far.
  pub fn folded(&self) -> u64 {
    self.folded
  }

  /// Returns the emission policy.
  pub fn emission(&self) -> EmissionPolicy {
    self.trigger.policy()
  }

  /// Folds one element into the local state.
  ///
  /// Returns the state to emit when the emission policy fires after this element. A
  /// completed count window resets the local state to the initial value.
  pub fn fold(&mut self, element: &E) -> AggregationResult<Option<S>> {
    let current = std::mem::replace(&mut self.state, self.initial.clone());
    self.state =
      (self.fold)(current, element).map_err(|e| AggregationError::fold(self.partition, e))?;
    self.folded += 1;
    trace!(partition = self.partition, folded = self.folded, "folded element");

    Ok(match self.trigger.on_element() {
      TriggerResult::Continue => None,
      TriggerResult::Fire => Some(self.state.clone()),
      TriggerResult::FireAndPurge => Some(std::mem::replace(&mut self.state, self.initial.clone())),
    })
  }

  /// Closes the current window: returns the local state and resets it to the initial value.
  pub fn window_boundary(&mut self) -> S {
    self.trigger.on_boundary();
    std::mem::replace(&mut self.state, self.initial.clone())
  }

  /// Handles the end of the partition input, returning the final emission if the policy
  /// produces one.
  pub fn finish(&mut self) -> Option<S> {
    if self.trigger.on_end() {
      Some(self.window_boundary())
    } else {
      None
    }
  }

  /// Drives the partition: folds `elements`, emitting contributions into `sink` until the
  /// input ends, the sink closes or `cancel` fires.
  ///
  /// A fold failure is returned as the task result; the partition stops immediately.
  pub async fn run<K>(
    mut self,
    mut elements: ElementStream<E>,
    sink: K,
    cancel: CancellationToken,
  ) -> AggregationResult<()>
  where
    K: ContributionSink<S>,
  {
    let span = info_span!("partition", operator = %self.operator, partition = self.partition);
    async move {
      self.emission().validate()?;
      let mut ticker = self.emission().interval().map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
      });
      let mut reported = 0u64;

      loop {
        tokio::select! {
          biased;
          _ = cancel.cancelled() => {
            debug!("partition cancelled");
            break;
          }
          _ = next_tick(&mut ticker) => {
            let state = self.window_boundary();
            if !self.emit(&sink, state).await {
              break;
            }
          }
          next = elements.next() => match next {
            Some(element) => {
              let emitted = self.fold(&element);
              self.report_folded(&mut reported);
              if let Some(state) = emitted? {
                if !self.emit(&sink, state).await {
                  break;
                }
              }
            }
            None => {
              if let Some(state) = self.finish() {
                self.emit(&sink, state).await;
              }
              debug!(folded = self.folded, "partition input exhausted");
              break;
            }
          },
        }
      }
      self.report_folded(&mut reported);
      Ok(())
    }
    .instrument(span)
    .await
  }

  async fn emit<K: ContributionSink<S>>(&self, sink: &K, state: S) -> bool {
    let delivered = sink
      .deliver(Contribution {
        partition: self.partition,
        state,
      })
      .await;
    if delivered {
      metrics::record_contribution(&self.operator, self.partition);
    } else {
      debug!("contribution sink closed");
    }
    delivered
  }

  fn report_folded(&self, reported: &mut u64) {
    if self.folded > *reported {
      metrics::record_elements_folded(&self.operator, self.partition, self.folded - *reported);
      *reported = self.folded;
    }
  }
}

async fn next_tick(ticker: &mut Option<Interval>) {
  match ticker {
    Some(interval) => {
      interval.tick().await;
    }
    None => std::future::pending().await,
  }
}
