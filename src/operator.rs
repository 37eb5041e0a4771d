//! # Aggregation Operator
//!
//! [`AggregationOperator`] binds an [`AggregationSpec`] and an [`OperatorConfig`] and runs
//! them against partitioned element streams:
//!
//! ```text
//! partition 0 ──► PartitionFolder ──┐
//! partition 1 ──► PartitionFolder ──┼──► contribution channel ──► GlobalAggregator ──► output
//! partition n ──► PartitionFolder ──┘
//! ```
//!
//! Each call to [`AggregationOperator::run`] reads the partition count from the stream,
//! builds a fresh global aggregator, spawns one Tokio task per partition plus one
//! aggregator task, and returns the output as an [`AggregationStream`]. The operator keeps
//! no per-run state, so it can be reused for any number of independent runs.
//!
//! ## Failures
//!
//! A failing user function or a panicking task aborts the run: the output stream yields
//! the error once and ends, and every task of the run is cancelled. Dropping the
//! [`AggregationStream`] cancels the run as well.
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use streamweave_aggregation::aggregation::AggregationSpec;
//! use streamweave_aggregation::config::OperatorConfig;
//! use streamweave_aggregation::emission::EmissionPolicy;
//! use streamweave_aggregation::operator::AggregationOperator;
//! use streamweave_aggregation::partitioning::PartitionedStream;
//!
//! # async fn example() -> Result<(), streamweave_aggregation::error::AggregationError> {
//! let spec = AggregationSpec::new(0u64, |count, _: &u32| count + 1).combine(|a, b| a + b);
//! // Partitions emit disjoint 5-element windows, so the rounds print 20, 40, ..., 100.
//! let config = OperatorConfig::new("count")
//!   .with_emission(EmissionPolicy::count_window(5).unwrap_or_default());
//! let operator = AggregationOperator::new(spec).with_config(config);
//!
//! let mut output = operator.run(PartitionedStream::round_robin(0..100u32, 4))?;
//! while let Some(total) = output.next().await {
//!   println!("elements so far: {}", total?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::aggregation::AggregationSpec;
use crate::aggregator::GlobalAggregator;
use crate::config::OperatorConfig;
use crate::error::{AggregationError, AggregationResult, Stage, panic_message};
use crate::folder::{Contribution, PartitionFolder};
use crate::metrics;
use crate::partitioning::PartitionedStream;
use futures::{Stream, StreamExt};
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Runs an aggregation over partitioned element streams.
pub struct AggregationOperator<E, S, T = S> {
  spec: AggregationSpec<E, S, T>,
  config: OperatorConfig,
}

impl<E, S, T> AggregationOperator<E, S, T>
where
  E: Send + 'static,
  S: Clone + Send + Sync + 'static,
  T: Send + 'static,
{
  /// Creates an operator with the default configuration.
  pub fn new(spec: AggregationSpec<E, S, T>) -> Self {
    Self {
      spec,
      config: OperatorConfig::default(),
    }
  }

  /// Replaces the operator configuration.
  pub fn with_config(mut self, config: OperatorConfig) -> Self {
    self.config = config;
    self
  }

  /// Returns the aggregation spec.
  pub fn spec(&self) -> &AggregationSpec<E, S, T> {
    &self.spec
  }

  /// Returns the operator configuration.
  pub fn config(&self) -> &OperatorConfig {
    &self.config
  }

  /// Starts a run over `stream` and returns its output.
  ///
  /// Must be called from within a Tokio runtime.
  ///
  /// # Errors
  ///
  /// Configuration errors (invalid [`OperatorConfig`], or a combine function with a stream
  /// of zero partitions) are returned before any task is spawned.
  pub fn run(&self, stream: PartitionedStream<E>) -> AggregationResult<AggregationStream<T>> {
    self.config.validate()?;
    let parallelism = stream.parallelism();
    let aggregator = GlobalAggregator::new(&self.spec, parallelism)?;
    let operator = self.config.name.clone();
    let capacity = self.config.channel_capacity;

    info!(
      operator = %operator,
      parallelism,
      mode = ?aggregator.mode(),
      emission = ?self.config.emission,
      "starting aggregation run"
    );

    let cancel = CancellationToken::new();
    let (contribution_tx, contribution_rx) =
      mpsc::channel::<AggregationResult<Contribution<S>>>(capacity);
    let (output_tx, output_rx) = mpsc::channel::<AggregationResult<T>>(capacity);

    for (partition, elements) in stream.into_partitions().into_iter().enumerate() {
      let folder = PartitionFolder::new(partition, &self.spec, self.config.emission)
        .with_operator_name(operator.clone());
      let handle = tokio::spawn(folder.run(elements, contribution_tx.clone(), cancel.clone()));
      tokio::spawn(supervise_partition(
        operator.clone(),
        partition,
        handle,
        contribution_tx.clone(),
      ));
    }
    // Only the partition tasks and their supervisors keep the channel open, so it closes
    // once every partition has finished.
    drop(contribution_tx);

    let handle = tokio::spawn(
      drive_aggregator(
        operator.clone(),
        aggregator,
        contribution_rx,
        output_tx.clone(),
        cancel.clone(),
      )
      .instrument(info_span!("aggregator", operator = %operator)),
    );
    tokio::spawn(supervise_aggregator(operator, handle, output_tx));

    Ok(AggregationStream::new(output_rx, cancel))
  }
}

impl<E, S: Clone, T> Clone for AggregationOperator<E, S, T> {
  fn clone(&self) -> Self {
    Self {
      spec: self.spec.clone(),
      config: self.config.clone(),
    }
  }
}

/// Forwards a partition task's failure to the aggregator.
async fn supervise_partition<S: Send>(
  operator: String,
  partition: usize,
  handle: JoinHandle<AggregationResult<()>>,
  contributions: mpsc::Sender<AggregationResult<Contribution<S>>>,
) {
  let failure = match handle.await {
    Ok(Ok(())) => return,
    Ok(Err(e)) => {
      let stage = e.stage().map(|s| s.as_str()).unwrap_or("task");
      metrics::record_failure(&operator, stage);
      e
    }
    Err(join) if join.is_panic() => {
      metrics::record_failure(&operator, "task");
      AggregationError::PartitionPanicked {
        partition,
        message: panic_message(join.into_panic()),
      }
    }
    Err(_) => return,
  };
  error!(operator = %operator, partition, error = %failure, "partition failed");
  // The aggregator reports the failure downstream and cancels the remaining partitions.
  let _ = contributions.send(Err(failure)).await;
}

/// Reports a panic of the aggregator task on the output stream.
async fn supervise_aggregator<T: Send>(
  operator: String,
  handle: JoinHandle<()>,
  output: mpsc::Sender<AggregationResult<T>>,
) {
  if let Err(join) = handle.await {
    if join.is_panic() {
      metrics::record_failure(&operator, "task");
      let message = panic_message(join.into_panic());
      error!(operator = %operator, %message, "aggregator panicked");
      let _ = output
        .send(Err(AggregationError::AggregatorPanicked { message }))
        .await;
    }
  }
}

/// Single consumer of the contribution channel.
async fn drive_aggregator<S, T>(
  operator: String,
  aggregator: GlobalAggregator<S, T>,
  contributions: mpsc::Receiver<AggregationResult<Contribution<S>>>,
  output: mpsc::Sender<AggregationResult<T>>,
  cancel: CancellationToken,
) where
  S: Clone + Send + Sync + 'static,
  T: Send + 'static,
{
  let barrier = aggregator.mode().is_barrier();
  let states = ReceiverStream::new(contributions).map(|next| next.map(|c| c.state));
  let results = aggregator.aggregate(states);
  tokio::pin!(results);

  let mut emitted = 0u64;
  loop {
    let next = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        warn!("aggregation run cancelled");
        break;
      }
      next = results.next() => next,
    };
    match next {
      Some(Ok(value)) => {
        emitted += 1;
        if barrier {
          metrics::record_round(&operator);
        } else {
          metrics::record_passthrough(&operator);
        }
        if output.send(Ok(value)).await.is_err() {
          debug!("output stream dropped");
          cancel.cancel();
          break;
        }
      }
      Some(Err(e)) => {
        if let Some(stage @ (Stage::Combine | Stage::Project)) = e.stage() {
          metrics::record_failure(&operator, stage.as_str());
          error!(error = %e, "aggregator failed");
        }
        cancel.cancel();
        let _ = output.send(Err(e)).await;
        break;
      }
      None => {
        info!(emitted, "aggregation run finished");
        break;
      }
    }
  }
}

/// Output of an aggregation run.
///
/// Yields `Ok(value)` for every emission and at most one `Err`, after which it ends.
/// Dropping the stream cancels every task of the run.
#[pin_project]
pub struct AggregationStream<T> {
  #[pin]
  inner: ReceiverStream<AggregationResult<T>>,
  cancel: CancellationToken,
  _guard: DropGuard,
}

impl<T> AggregationStream<T> {
  fn new(receiver: mpsc::Receiver<AggregationResult<T>>, cancel: CancellationToken) -> Self {
    Self {
      inner: ReceiverStream::new(receiver),
      _guard: cancel.clone().drop_guard(),
      cancel,
    }
  }

  /// Cancels the run. Pending outputs already queued can still be read.
  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  /// Returns true once the run has been cancelled or has failed.
  pub fn is_cancelled(&self) -> bool {
    self.cancel.is_cancelled()
  }
}

impl<T> Stream for AggregationStream<T> {
  type Item = AggregationResult<T>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    self.project().inner.poll_next(cx)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}
