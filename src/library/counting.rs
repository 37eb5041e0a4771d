//! Counting aggregations over edge streams.

use crate::aggregation::AggregationSpec;
use crate::edge::Edge;
use num_traits::{CheckedAdd, Zero};
use std::collections::HashSet;
use std::hash::Hash;

/// Counts the edges of the stream.
pub fn edge_count<K, V>() -> AggregationSpec<Edge<K, V>, u64>
where
  K: 'static,
  V: 'static,
{
  AggregationSpec::new(0u64, |count, _: &Edge<K, V>| count + 1).combine(|a, b| a + b)
}

/// Sums the edge values.
///
/// Overflow is reported as a fold or combine failure instead of wrapping.
pub fn total_weight<K, V>() -> AggregationSpec<Edge<K, V>, V>
where
  K: 'static,
  V: Zero + CheckedAdd + Clone + Send + Sync + 'static,
{
  AggregationSpec::try_new(V::zero(), |sum: V, edge: &Edge<K, V>| {
    sum
      .checked_add(edge.value())
      .ok_or_else(|| "edge weight sum overflowed".into())
  })
  .try_combine(|a: V, b: V| {
    a.checked_add(&b)
      .ok_or_else(|| "edge weight sum overflowed".into())
  })
}

/// Counts the distinct vertices seen on either end of an edge.
pub fn distinct_vertices<K, V>() -> AggregationSpec<Edge<K, V>, HashSet<K>, usize>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: 'static,
{
  AggregationSpec::new(HashSet::new(), |mut seen: HashSet<K>, edge: &Edge<K, V>| {
    seen.insert(edge.source().clone());
    seen.insert(edge.target().clone());
    seen
  })
  .combine(|mut a, b| {
    a.extend(b);
    a
  })
  .project(|seen| seen.len())
}
