//! # StreamWeave Aggregation
//!
//! Partitioned incremental aggregation over edge streams.
//!
//! An element stream (typically graph edges) is split across `P` partitions. Each partition
//! folds its elements into a local aggregate state; a single global aggregator combines the
//! partition states into one global state and emits it, optionally projected into an output
//! value.
//!
//! ## Key Features
//!
//! - **Partition-local folding**: one Tokio task per partition, no shared mutable state
//! - **Barrier combine**: the global state is emitted once every partition has contributed
//! - **Pass-through mode**: without a combine function, partition states flow to the output
//! - **Transient state**: optionally reset the global state between contributions
//! - **Emission policies**: per element, count windows, processing-time windows, end of input
//! - **Fail-fast**: a failing user function aborts the run with a typed error
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use streamweave_aggregation::config::OperatorConfig;
//! use streamweave_aggregation::edge::Edge;
//! use streamweave_aggregation::emission::EmissionPolicy;
//! use streamweave_aggregation::library::edge_count;
//! use streamweave_aggregation::operator::AggregationOperator;
//! use streamweave_aggregation::partitioning::PartitionedStream;
//!
//! # async fn example() -> Result<(), streamweave_aggregation::error::AggregationError> {
//! let edges = vec![Edge::new(1, 2, ()), Edge::new(2, 3, ()), Edge::new(3, 1, ())];
//! let operator = AggregationOperator::new(edge_count())
//!   .with_config(OperatorConfig::new("edges").with_emission(EmissionPolicy::EndOfStream));
//! let mut counts = operator.run(PartitionedStream::round_robin(edges, 3))?;
//! while let Some(count) = counts.next().await {
//!   println!("edge count: {}", count?);
//! }
//! # Ok(())
//! # }
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Aggregation specs: user functions, initial state and mode.
pub mod aggregation;
/// Barrier-based global combination of partition states.
pub mod aggregator;
/// Operator configuration.
pub mod config;
/// Graph edge element type.
pub mod edge;
/// Partition emission policies.
pub mod emission;
/// Error types.
pub mod error;
/// Partition-local folding.
pub mod folder;
/// Ready-made aggregations over edge streams.
pub mod library;
/// Prometheus-compatible metrics.
pub mod metrics;
/// Operator facade that wires partitions to the global aggregator.
pub mod operator;
/// Partitioned element streams.
pub mod partitioning;

pub use aggregation::{AggregationMode, AggregationSpec};
pub use aggregator::GlobalAggregator;
pub use config::OperatorConfig;
pub use edge::Edge;
pub use emission::EmissionPolicy;
pub use error::{AggregationError, ConfigurationError, Stage, UserFunctionError};
pub use folder::{Contribution, PartitionFolder};
pub use operator::{AggregationOperator, AggregationStream};
pub use partitioning::PartitionedStream;

#[cfg(test)]
mod aggregation_test;
#[cfg(test)]
mod edge_test;
#[cfg(test)]
mod metrics_test;
#[cfg(test)]
mod operator_test;
