//! # Aggregation Library
//!
//! Ready-made aggregation specs over [`Edge`](crate::edge::Edge) streams.
//!
//! - [`edge_count`]: number of edges.
//! - [`total_weight`]: sum of edge values.
//! - [`distinct_vertices`]: number of distinct vertices.
//! - [`connected_components`]: connected components, merged from partition forests.
//!
//! Each returns an [`AggregationSpec`](crate::aggregation::AggregationSpec) in continuous
//! mode; callers adjust it (for instance `.transient(true)`) before building an operator.

pub mod connected_components;
pub mod counting;
pub mod disjoint_set;

pub use connected_components::{Components, connected_components};
pub use counting::{distinct_vertices, edge_count, total_weight};
pub use disjoint_set::DisjointSet;
