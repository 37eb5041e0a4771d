//! Prometheus-compatible metrics for aggregation runs.
//!
//! Counters are recorded through the [`metrics`] facade. Without an installed recorder every
//! call is a no-op, so applications opt in by installing their exporter at startup.
//!
//! - `streamweave_aggregation_elements_total{operator, partition}`: elements folded.
//! - `streamweave_aggregation_contributions_total{operator, partition}`: partition states
//!   emitted to the global aggregator.
//! - `streamweave_aggregation_rounds_total{operator}`: completed barrier rounds.
//! - `streamweave_aggregation_passthrough_total{operator}`: contributions forwarded in
//!   pass-through mode.
//! - `streamweave_aggregation_failures_total{operator, stage}`: fatal failures.

use metrics::counter;

/// Records elements folded by a partition.
pub fn record_elements_folded(operator: &str, partition: usize, count: u64) {
  counter!(
    "streamweave_aggregation_elements_total",
    "operator" => operator.to_string(),
    "partition" => partition.to_string()
  )
  .increment(count);
}

/// Records a partition state sent to the global aggregator.
pub fn record_contribution(operator: &str, partition: usize) {
  counter!(
    "streamweave_aggregation_contributions_total",
    "operator" => operator.to_string(),
    "partition" => partition.to_string()
  )
  .increment(1);
}

/// Records a completed barrier round.
pub fn record_round(operator: &str) {
  counter!(
    "streamweave_aggregation_rounds_total",
    "operator" => operator.to_string()
  )
  .increment(1);
}

/// Records a contribution forwarded without combining.
pub fn record_passthrough(operator: &str) {
  counter!(
    "streamweave_aggregation_passthrough_total",
    "operator" => operator.to_string()
  )
  .increment(1);
}

/// Records a fatal failure. `stage` is the failing function, or `"task"` for panics.
pub fn record_failure(operator: &str, stage: &str) {
  counter!(
    "streamweave_aggregation_failures_total",
    "operator" => operator.to_string(),
    "stage" => stage.to_string()
  )
  .increment(1);
}
