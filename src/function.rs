//! Named function-value types for the roles a pipeline stores long-term.
//!
//! Transformations and predicates that only live for the duration of a
//! method call stay as ordinary generic `Fn` bounds; the aliases here cover
//! the callables that end up owned by a stage or a [`Collector`], where a
//! boxed or shared trait object keeps type parameters from proliferating.
//!
//! [`Collector`]: crate::seq::Collector

use std::cmp::Ordering;
use std::sync::Arc;

/// Produces a fresh value on demand: generator elements, accumulator seeds,
/// rebuilt pipelines.
pub type Supplier<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Total ordering between two elements, as stored by a sort stage.
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Folds one element into an accumulator, returning the updated accumulator.
pub type Accumulator<A, T> = Arc<dyn Fn(A, T) -> A + Send + Sync>;

/// Merges two partial accumulators produced by independent partitions.
pub type Combiner<A> = Arc<dyn Fn(A, A) -> A + Send + Sync>;

/// Converts a finished accumulator into the final result shape.
pub type Finisher<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;
