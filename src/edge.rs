//! Graph edges, the canonical element type of an edge stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed edge `source -> target` carrying a value.
///
/// Edges are immutable records; aggregations only read them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge<K, V> {
  source: K,
  target: K,
  value: V,
}

impl<K, V> Edge<K, V> {
  /// Creates a new edge.
  pub fn new(source: K, target: K, value: V) -> Self {
    Self {
      source,
      target,
      value,
    }
  }

  /// Returns the source vertex.
  pub fn source(&self) -> &K {
    &self.source
  }

  /// Returns the target vertex.
  pub fn target(&self) -> &K {
    &self.target
  }

  /// Returns the edge value.
  pub fn value(&self) -> &V {
    &self.value
  }

  /// Returns the edge with source and target swapped.
  pub fn reverse(self) -> Self {
    Self {
      source: self.target,
      target: self.source,
      value: self.value,
    }
  }

  /// Splits the edge into `(source, target, value)`.
  pub fn into_parts(self) -> (K, K, V) {
    (self.source, self.target, self.value)
  }
}

impl<K> Edge<K, ()> {
  /// Creates an edge without a value.
  pub fn unweighted(source: K, target: K) -> Self {
    Self::new(source, target, ())
  }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Edge<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} -> {} ({})", self.source, self.target, self.value)
  }
}

impl<K, V> From<(K, K, V)> for Edge<K, V> {
  fn from((source, target, value): (K, K, V)) -> Self {
    Self::new(source, target, value)
  }
}
