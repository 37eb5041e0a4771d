use crate::aggregation::{AggregationMode, AggregationSpec};
use crate::edge::Edge;

type UnitEdge = Edge<u32, ()>;

fn count_spec() -> AggregationSpec<UnitEdge, u64> {
  AggregationSpec::new(0u64, |count, _: &UnitEdge| count + 1)
}

#[test]
fn test_mode_derivation() {
  assert_eq!(AggregationMode::of(false, false), AggregationMode::PassThrough);
  assert_eq!(AggregationMode::of(false, true), AggregationMode::PassThrough);
  assert_eq!(AggregationMode::of(true, false), AggregationMode::Continuous);
  assert_eq!(AggregationMode::of(true, true), AggregationMode::Transient);
  assert!(!AggregationMode::PassThrough.is_barrier());
  assert!(AggregationMode::Transient.is_barrier());
}

#[test]
fn test_new_spec_defaults() {
  let spec = count_spec();
  assert_eq!(*spec.initial(), 0);
  assert!(!spec.has_combine());
  assert!(!spec.has_projection());
  assert!(!spec.is_transient());
  assert_eq!(spec.mode(), AggregationMode::PassThrough);
}

#[test]
fn test_builder_sets_functions() {
  let spec = count_spec()
    .combine(|a, b| a + b)
    .transient(true)
    .project(|count| count.to_string());
  assert!(spec.has_combine());
  assert!(spec.has_projection());
  assert_eq!(spec.mode(), AggregationMode::Transient);

  let edge = Edge::unweighted(1u32, 2u32);
  assert_eq!((spec.fold_fn())(41, &edge).unwrap(), 42);
  assert_eq!((spec.combine_fn().unwrap())(2, 3).unwrap(), 5);
  assert_eq!((spec.project_fn())(7).unwrap(), "7");
}

#[test]
fn test_identity_projection_without_project() {
  let spec = count_spec();
  assert_eq!((spec.project_fn())(9).unwrap(), 9);
}

#[test]
fn test_fallible_functions_surface_errors() {
  let spec = AggregationSpec::try_new(0u64, |count, edge: &UnitEdge| {
    if edge.source() == edge.target() {
      Err("self loop".into())
    } else {
      Ok(count + 1)
    }
  });
  let err = (spec.fold_fn())(0, &Edge::unweighted(3, 3)).unwrap_err();
  assert_eq!(err.to_string(), "self loop");
}

#[test]
fn test_clone_shares_functions() {
  let spec = count_spec().combine(|a, b| a.max(b));
  let cloned = spec.clone();
  assert_eq!((cloned.combine_fn().unwrap())(4, 9).unwrap(), 9);
  assert_eq!(format!("{:?}", cloned), format!("{:?}", spec));
}
