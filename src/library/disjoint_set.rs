//! Union-find over graph vertices.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A disjoint-set forest with path compression and union by rank.
///
/// Used as the aggregate state of connected-components aggregations: every partition
/// builds a forest from its edges, and forests are merged by replaying the unions of one
/// into the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisjointSet<K: Eq + Hash> {
  parent: HashMap<K, K>,
  rank: HashMap<K, u32>,
}

impl<K: Eq + Hash> Default for DisjointSet<K> {
  fn default() -> Self {
    Self {
      parent: HashMap::new(),
      rank: HashMap::new(),
    }
  }
}

impl<K> DisjointSet<K>
where
  K: Eq + Hash + Clone,
{
  /// Creates an empty forest.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the number of vertices.
  pub fn len(&self) -> usize {
    self.parent.len()
  }

  /// Returns true when no vertex has been added.
  pub fn is_empty(&self) -> bool {
    self.parent.is_empty()
  }

  /// Returns true if `vertex` is in the forest.
  pub fn contains(&self, vertex: &K) -> bool {
    self.parent.contains_key(vertex)
  }

  /// Adds `vertex` as a singleton set if it is not present yet.
  pub fn make_set(&mut self, vertex: K) {
    if !self.parent.contains_key(&vertex) {
      self.rank.insert(vertex.clone(), 0);
      self.parent.insert(vertex.clone(), vertex);
    }
  }

  /// Returns the root of the set containing `vertex`, compressing the path on the way.
  pub fn find(&mut self, vertex: &K) -> Option<K> {
    let mut root = self.parent.get(vertex)?.clone();
    while let Some(parent) = self.parent.get(&root) {
      if *parent == root {
        break;
      }
      root = parent.clone();
    }

    let mut node = vertex.clone();
    while node != root {
      let next = match self.parent.insert(node, root.clone()) {
        Some(next) => next,
        None => break,
      };
      node = next;
    }
    Some(root)
  }

  /// Merges the sets containing `a` and `b`, adding either vertex if missing.
  pub fn union(&mut self, a: K, b: K) {
    self.make_set(a.clone());
    self.make_set(b.clone());
    let (Some(root_a), Some(root_b)) = (self.find(&a), self.find(&b)) else {
      return;
    };
    if root_a == root_b {
      return;
    }

    let rank_a = self.rank.get(&root_a).copied().unwrap_or(0);
    let rank_b = self.rank.get(&root_b).copied().unwrap_or(0);
    if rank_a < rank_b {
      self.parent.insert(root_a, root_b);
    } else if rank_a > rank_b {
      self.parent.insert(root_b, root_a);
    } else {
      self.parent.insert(root_b, root_a.clone());
      self.rank.insert(root_a, rank_a + 1);
    }
  }

  /// Merges another forest into this one.
  pub fn merge(mut self, other: DisjointSet<K>) -> Self {
    for (vertex, parent) in other.parent {
      self.union(vertex, parent);
    }
    self
  }

  /// Returns the sets, keyed by root.
  pub fn components(&mut self) -> HashMap<K, Vec<K>> {
    let vertices: Vec<K> = self.parent.keys().cloned().collect();
    let mut components: HashMap<K, Vec<K>> = HashMap::new();
    for vertex in vertices {
      if let Some(root) = self.find(&vertex) {
        components.entry(root).or_default().push(vertex);
      }
    }
    components
  }

  /// Returns the number of disjoint sets.
  pub fn component_count(&mut self) -> usize {
    self.components().len()
  }
}

impl<K> DisjointSet<K>
where
  K: Eq + Hash + Clone + Ord,
{
  /// Returns every set as a sorted member list, ordered by smallest member.
  pub fn sorted_components(&mut self) -> Vec<Vec<K>> {
    let ordered: BTreeMap<K, Vec<K>> = self
      .components()
      .into_values()
      .filter_map(|mut members| {
        members.sort();
        members.first().cloned().map(|first| (first, members))
      })
      .collect();
    ordered.into_values().collect()
  }
}
