//! # Aggregation Specification
//!
//! [`AggregationSpec`] bundles the user functions and settings that define an aggregation:
//!
//! - **fold** (required): `(S, &E) -> S`, accumulates one element into a partition-local state.
//! - **combine** (optional): `(S, S) -> S`, associative merge of two states. Without it the
//!   global stage is a pass-through.
//! - **project** (optional): `S -> T`, converts the global state into the output value.
//!   Without it the output type is the state type itself.
//! - **initial**: seed of every partition fold and of the global accumulator.
//! - **transient**: whether the global accumulator is reset after contributions.
//!
//! Functions are held behind `Arc`, so a spec is cheap to clone and safe to share between
//! partition tasks and the aggregator. A spec is immutable once built.
//!
//! ## Example
//!
//! ```rust
//! use streamweave_aggregation::aggregation::{AggregationMode, AggregationSpec};
//!
//! let spec = AggregationSpec::new(0i64, |sum, value: &i64| sum + value)
//!   .combine(|a, b| a + b)
//!   .project(|sum| format!("total={}", sum));
//!
//! assert_eq!(spec.mode(), AggregationMode::Continuous);
//! ```

use crate::error::UserFunctionError;
use std::fmt;
use std::sync::Arc;

/// Partition-local fold: next state from the current state and one element.
pub type FoldFn<E, S> = Arc<dyn Fn(S, &E) -> Result<S, UserFunctionError> + Send + Sync>;

/// Associative merge of two aggregate states.
pub type CombineFn<S> = Arc<dyn Fn(S, S) -> Result<S, UserFunctionError> + Send + Sync>;

/// Projection of the global state into an output value.
pub type ProjectFn<S, T> = Arc<dyn Fn(S) -> Result<T, UserFunctionError> + Send + Sync>;

/// How the global stage treats partition contributions.
///
/// Derived from the spec: whether a combine function is present and whether the state is
/// transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationMode {
  /// No combine function: every contribution is forwarded as it arrives.
  PassThrough,
  /// Barrier combine, the global state is retained across rounds.
  Continuous,
  /// Barrier combine, the global state is reset to the initial value after every
  /// contribution (not only after a completed round).
  Transient,
}

impl AggregationMode {
  /// Derives the mode from the presence of a combine function and the transient flag.
  pub fn of(has_combine: bool, transient: bool) -> Self {
    match (has_combine, transient) {
      (false, _) => AggregationMode::PassThrough,
      (true, false) => AggregationMode::Continuous,
      (true, true) => AggregationMode::Transient,
    }
  }

  /// Returns true if contributions are combined behind a barrier.
  pub fn is_barrier(&self) -> bool {
    !matches!(self, AggregationMode::PassThrough)
  }
}

/// Immutable configuration of a partitioned aggregation over elements `E`, with state `S`
/// and output `T`.
pub struct AggregationSpec<E, S, T = S> {
  fold: FoldFn<E, S>,
  combine: Option<CombineFn<S>>,
  project: ProjectFn<S, T>,
  projected: bool,
  initial: S,
  transient: bool,
}

impl<E, S> AggregationSpec<E, S, S>
where
  E: 'static,
  S: Clone + Send + Sync + 'static,
{
  /// Creates a spec from an initial state and an infallible fold function.
  ///
  /// The spec starts in pass-through mode with no projection and `transient = false`.
  pub fn new<F>(initial: S, fold: F) -> Self
  where
    F: Fn(S, &E) -> S + Send + Sync + 'static,
  {
    Self::try_new(initial, move |state, element| Ok(fold(state, element)))
  }

  /// Creates a spec from an initial state and a fallible fold function.
  ///
  /// A fold error is fatal to the partition that raised it.
  pub fn try_new<F>(initial: S, fold: F) -> Self
  where
    F: Fn(S, &E) -> Result<S, UserFunctionError> + Send + Sync + 'static,
  {
    Self {
      fold: Arc::new(fold),
      combine: None,
      project: Arc::new(|state: S| Ok::<S, UserFunctionError>(state)),
      projected: false,
      initial,
      transient: false,
    }
  }
}

impl<E, S, T> AggregationSpec<E, S, T>
where
  E: 'static,
  S: Clone + Send + Sync + 'static,
  T: 'static,
{
  /// Sets an infallible combine function, switching the global stage to barrier mode.
  ///
  /// The function must be associative, and should be commutative: the arrival order of
  /// contributions within a round is unspecified.
  pub fn combine<F>(self, combine: F) -> Self
  where
    F: Fn(S, S) -> S + Send + Sync + 'static,
  {
    self.try_combine(move |a, b| Ok(combine(a, b)))
  }

  /// Sets a fallible combine function.
  pub fn try_combine<F>(mut self, combine: F) -> Self
  where
    F: Fn(S, S) -> Result<S, UserFunctionError> + Send + Sync + 'static,
  {
    self.combine = Some(Arc::new(combine));
    self
  }

  /// Sets the transient flag.
  pub fn transient(mut self, transient: bool) -> Self {
    self.transient = transient;
    self
  }

  /// Sets an infallible projection, changing the output type to `U`.
  pub fn project<U, F>(self, project: F) -> AggregationSpec<E, S, U>
  where
    U: 'static,
    F: Fn(S) -> U + Send + Sync + 'static,
  {
    self.try_project(move |state| Ok(project(state)))
  }

  /// Sets a fallible projection, changing the output type to `U`.
  pub fn try_project<U, F>(self, project: F) -> AggregationSpec<E, S, U>
  where
    U: 'static,
    F: Fn(S) -> Result<U, UserFunctionError> + Send + Sync + 'static,
  {
    AggregationSpec {
      fold: self.fold,
      combine: self.combine,
      project: Arc::new(project),
      projected: true,
      initial: self.initial,
      transient: self.transient,
    }
  }
}

impl<E, S, T> AggregationSpec<E, S, T> {
  /// Returns the seed state.
  pub fn initial(&self) -> &S {
    &self.initial
  }

  /// Returns the transient flag.
  pub fn is_transient(&self) -> bool {
    self.transient
  }

  /// Returns true if a combine function is configured.
  pub fn has_combine(&self) -> bool {
    self.combine.is_some()
  }

  /// Returns true if a projection was configured.
  pub fn has_projection(&self) -> bool {
    self.projected
  }

  /// Returns the aggregation mode derived from this spec.
  pub fn mode(&self) -> AggregationMode {
    AggregationMode::of(self.combine.is_some(), self.transient)
  }

  /// Returns the fold function.
  pub fn fold_fn(&self) -> &FoldFn<E, S> {
    &self.fold
  }

  /// Returns the combine function, if any.
  pub fn combine_fn(&self) -> Option<&CombineFn<S>> {
    self.combine.as_ref()
  }

  /// Returns the projection (the identity when none was configured).
  pub fn project_fn(&self) -> &ProjectFn<S, T> {
    &self.project
  }
}

impl<E, S: Clone, T> Clone for AggregationSpec<E, S, T> {
  fn clone(&self) -> Self {
    Self {
      fold: Arc::clone(&self.fold),
      combine: self.combine.clone(),
      project: Arc::clone(&self.project),
      projected: self.projected,
      initial: self.initial.clone(),
      transient: self.transient,
    }
  }
}

impl<E, S: fmt::Debug, T> fmt::Debug for AggregationSpec<E, S, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AggregationSpec")
      .field("initial", &self.initial)
      .field("combine", &self.combine.is_some())
      .field("project", &self.projected)
      .field("transient", &self.transient)
      .finish()
  }
}
