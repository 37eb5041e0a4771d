//! # Partitioned Element Streams
//!
//! [`PartitionedStream`] is the contract between the stream source and an aggregation: a
//! fixed number of element streams, one per partition, plus the declared parallelism. The
//! aggregation reads the parallelism once, when it builds the global aggregator for a run.
//!
//! ## Construction
//!
//! - [`PartitionedStream::from_streams`]: partitions already produced elsewhere.
//! - [`PartitionedStream::from_partitions`]: in-memory vectors, one per partition.
//! - [`PartitionedStream::round_robin`]: splits an iterator across `P` partitions.
//! - [`PartitionedStream::partition_by_key`]: routes a single stream by `hash(key) % P`
//!   through a router task.
//! - [`PartitionedStream::partition_edges_by_source`]: edge streams keyed by source vertex.
//!
//! ```rust
//! use streamweave_aggregation::partitioning::PartitionedStream;
//!
//! let stream = PartitionedStream::round_robin(1..=10, 3);
//! assert_eq!(stream.parallelism(), 3);
//! ```

use crate::edge::Edge;
use futures::{Stream, StreamExt, stream};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::trace;

/// A boxed stream of elements belonging to one partition.
pub type ElementStream<E> = Pin<Box<dyn Stream<Item = E> + Send>>;

/// Maps a key to a partition index in `0..parallelism`.
///
/// Returns 0 when `parallelism` is 0.
pub fn partition_for_key<K: Hash + ?Sized>(key: &K, parallelism: usize) -> usize {
  if parallelism == 0 {
    return 0;
  }
  let mut hasher = DefaultHasher::new();
  key.hash(&mut hasher);
  (hasher.finish() % parallelism as u64) as usize
}

/// A stream of elements split into a fixed number of partitions.
pub struct PartitionedStream<E> {
  partitions: Vec<ElementStream<E>>,
}

impl<E: Send + 'static> PartitionedStream<E> {
  /// Wraps existing partition streams. The parallelism is the number of streams.
  pub fn from_streams(partitions: Vec<ElementStream<E>>) -> Self {
    Self { partitions }
  }

  /// Builds partitions from in-memory element lists.
  pub fn from_partitions<I>(partitions: Vec<I>) -> Self
  where
    I: IntoIterator<Item = E>,
    I::IntoIter: Send + 'static,
  {
    Self {
      partitions: partitions
        .into_iter()
        .map(|elements| Box::pin(stream::iter(elements)) as ElementStream<E>)
        .collect(),
    }
  }

  /// Distributes elements across `parallelism` partitions in round-robin order.
  pub fn round_robin<I>(elements: I, parallelism: usize) -> Self
  where
    I: IntoIterator<Item = E>,
  {
    let mut buckets: Vec<Vec<E>> = (0..parallelism).map(|_| Vec::new()).collect();
    if parallelism > 0 {
      for (i, element) in elements.into_iter().enumerate() {
        buckets[i % parallelism].push(element);
      }
    }
    Self::from_partitions(buckets)
  }

  /// Routes a single stream into `parallelism` partitions by `hash(key(element)) % parallelism`.
  ///
  /// A router task forwards each element to its partition over a bounded channel, so
  /// elements with the same key always land in the same partition and keep their relative
  /// order. Must be called from within a Tokio runtime.
  pub fn partition_by_key<S, K, F>(
    input: S,
    parallelism: usize,
    channel_capacity: usize,
    key: F,
  ) -> Self
  where
    S: Stream<Item = E> + Send + 'static,
    K: Hash + 'static,
    F: Fn(&E) -> K + Send + 'static,
  {
    if parallelism == 0 {
      return Self {
        partitions: Vec::new(),
      };
    }
    let capacity = channel_capacity.max(1);
    let (senders, partitions): (Vec<_>, Vec<_>) = (0..parallelism)
      .map(|_| {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Box::pin(ReceiverStream::new(rx)) as ElementStream<E>)
      })
      .unzip();
    tokio::spawn(router_task(Box::pin(input), senders, key));
    Self { partitions }
  }

  /// Returns the declared number of partitions.
  pub fn parallelism(&self) -> usize {
    self.partitions.len()
  }

  /// Consumes the stream, returning the partition streams in index order.
  pub fn into_partitions(self) -> Vec<ElementStream<E>> {
    self.partitions
  }
}

impl<K, V> PartitionedStream<Edge<K, V>>
where
  K: Hash + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// Routes an edge stream by source vertex, so all out-edges of a vertex share a partition.
  pub fn partition_edges_by_source<S>(input: S, parallelism: usize, channel_capacity: usize) -> Self
  where
    S: Stream<Item = Edge<K, V>> + Send + 'static,
  {
    Self::partition_by_key(input, parallelism, channel_capacity, |edge: &Edge<K, V>| {
      let mut hasher = DefaultHasher::new();
      edge.source().hash(&mut hasher);
      hasher.finish()
    })
  }
}

async fn router_task<E, K, F>(
  mut input: ElementStream<E>,
  senders: Vec<mpsc::Sender<E>>,
  key: F,
) where
  K: Hash + 'static,
  F: Fn(&E) -> K,
{
  while let Some(element) = input.next().await {
    let partition = partition_for_key(&key(&element), senders.len());
    trace!(partition, "routing element");
    if senders[partition].send(element).await.is_err() {
      // Downstream partition is gone; the run was cancelled.
      break;
    }
  }
}
