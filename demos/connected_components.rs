//! # Streaming connected components
//!
//! Routes a small edge stream to three partitions by source vertex, folds each partition
//! into a disjoint-set forest, and prints the merged components after every round of
//! two-edge windows.
//!
//! Run with `RUST_LOG=streamweave_aggregation=debug` to see partition and round logging.

use futures::{StreamExt, stream};
use streamweave_aggregation::config::OperatorConfig;
use streamweave_aggregation::edge::Edge;
use streamweave_aggregation::emission::EmissionPolicy;
use streamweave_aggregation::error::AggregationError;
use streamweave_aggregation::library::{connected_components, edge_count};
use streamweave_aggregation::operator::AggregationOperator;
use streamweave_aggregation::partitioning::PartitionedStream;
use tracing_subscriber::EnvFilter;

const PARALLELISM: usize = 3;

fn sample_edges() -> Vec<Edge<u64, ()>> {
  [
    (1, 2),
    (1, 3),
    (2, 3),
    (1, 4),
    (3, 5),
    (6, 7),
    (6, 8),
    (9, 8),
    (10, 11),
    (4, 12),
    (13, 14),
    (14, 10),
  ]
  .into_iter()
  .map(|(source, target)| Edge::unweighted(source, target))
  .collect()
}

#[tokio::main]
async fn main() -> Result<(), AggregationError> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let window = EmissionPolicy::count_window(2).unwrap_or_default();
  let config = OperatorConfig::new("connected-components").with_emission(window);
  let operator = AggregationOperator::new(connected_components()).with_config(config);

  let partitions = PartitionedStream::partition_edges_by_source(
    stream::iter(sample_edges()),
    PARALLELISM,
    16,
  );
  let mut components = operator.run(partitions)?;
  while let Some(result) = components.next().await {
    println!("components: {}", result?);
  }

  let counter = AggregationOperator::new(edge_count())
    .with_config(OperatorConfig::new("edge-count").with_emission(EmissionPolicy::EndOfStream));
  let mut counts = counter.run(PartitionedStream::round_robin(sample_edges(), PARALLELISM))?;
  while let Some(count) = counts.next().await {
    println!("edges: {}", count?);
  }

  Ok(())
}
