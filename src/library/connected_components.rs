//! Connected components of an edge stream.
//!
//! Every partition unions the endpoints of its edges into a [`DisjointSet`]; the global
//! stage merges the partition forests and projects the result into sorted component lists.
//! Edges are treated as undirected.

use super::disjoint_set::DisjointSet;
use crate::aggregation::AggregationSpec;
use crate::edge::Edge;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Connected components at one emission, each a sorted member list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Components<K> {
  components: Vec<Vec<K>>,
}

impl<K: Ord + Clone> Components<K> {
  /// Returns the number of components.
  pub fn len(&self) -> usize {
    self.components.len()
  }

  /// Returns true if no vertex was seen.
  pub fn is_empty(&self) -> bool {
    self.components.is_empty()
  }

  /// Returns the components, ordered by their smallest member.
  pub fn as_slice(&self) -> &[Vec<K>] {
    &self.components
  }

  /// Returns the component containing `vertex`.
  pub fn component_of(&self, vertex: &K) -> Option<&[K]> {
    self
      .components
      .iter()
      .find(|members| members.binary_search(vertex).is_ok())
      .map(Vec::as_slice)
  }
}

impl<K: fmt::Display> fmt::Display for Components<K> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, members) in self.components.iter().enumerate() {
      if i > 0 {
        write!(f, " ")?;
      }
      write!(f, "{{")?;
      for (j, member) in members.iter().enumerate() {
        if j > 0 {
          write!(f, ", ")?;
        }
        write!(f, "{}", member)?;
      }
      write!(f, "}}")?;
    }
    Ok(())
  }
}

/// Continuous connected components: partition forests are merged and retained across
/// rounds.
pub fn connected_components<K, V>() -> AggregationSpec<Edge<K, V>, DisjointSet<K>, Components<K>>
where
  K: Eq + Hash + Ord + Clone + Send + Sync + 'static,
  V: 'static,
{
  AggregationSpec::new(
    DisjointSet::new(),
    |mut forest: DisjointSet<K>, edge: &Edge<K, V>| {
      forest.union(edge.source().clone(), edge.target().clone());
      forest
    },
  )
  .combine(DisjointSet::merge)
  .project(|mut forest| Components {
    components: forest.sorted_components(),
  })
}
