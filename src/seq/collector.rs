//! The pluggable accumulation strategy used by `collect`.

use crate::function::{Accumulator, Combiner, Finisher, Supplier};
use std::sync::Arc;

/// A four-part accumulation strategy: make a fresh accumulator, fold one
/// element in, merge two partial accumulators (parallel evaluation only),
/// and convert the finished accumulator into the result shape.
///
/// `accumulate` and `combine` must agree: merging partial accumulators has
/// to be equivalent to accumulating the same elements into one. That is what
/// lets sequential and parallel evaluation of the same pipeline produce the
/// same result.
pub struct Collector<T, A, R> {
    pub(crate) supplier: Supplier<A>,
    pub(crate) accumulate: Accumulator<A, T>,
    pub(crate) combine: Combiner<A>,
    pub(crate) finish: Finisher<A, R>,
}

impl<T, A, R> Collector<T, A, R>
where
    T: Send + 'static,
    A: Send + 'static,
    R: 'static,
{
    pub fn of(
        supplier: impl Fn() -> A + Send + Sync + 'static,
        accumulate: impl Fn(A, T) -> A + Send + Sync + 'static,
        combine: impl Fn(A, A) -> A + Send + Sync + 'static,
        finish: impl Fn(A) -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            supplier: Arc::new(supplier),
            accumulate: Arc::new(accumulate),
            combine: Arc::new(combine),
            finish: Arc::new(finish),
        }
    }

    /// Adapt the final result with an extra finishing step.
    pub fn and_then<R2: 'static>(
        self,
        f: impl Fn(R) -> R2 + Send + Sync + 'static,
    ) -> Collector<T, A, R2> {
        let finish = self.finish;
        Collector {
            supplier: self.supplier,
            accumulate: self.accumulate,
            combine: self.combine,
            finish: Arc::new(move |acc| f(finish(acc))),
        }
    }
}

impl<T, A, R> Clone for Collector<T, A, R> {
    fn clone(&self) -> Self {
        Self {
            supplier: self.supplier.clone(),
            accumulate: self.accumulate.clone(),
            combine: self.combine.clone(),
            finish: self.finish.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_collector_parts_compose() {
        let collector: Collector<i32, i32, i32> =
            Collector::of(|| 0, |acc, x| acc + x, |a, b| a + b, |acc| acc);

        let mut acc = (collector.supplier)();
        for x in [1, 2, 3] {
            acc = (collector.accumulate)(acc, x);
        }
        let other = (collector.accumulate)((collector.supplier)(), 4);
        let merged = (collector.combine)(acc, other);

        assert_eq!((collector.finish)(merged), 10);
    }

    #[test]
    fn test_and_then_runs_after_finish() {
        let collector: Collector<i32, Vec<i32>, Vec<i32>> = Collector::of(
            Vec::new,
            |mut v, x| {
                v.push(x);
                v
            },
            |mut a, mut b| {
                a.append(&mut b);
                a
            },
            |v| v,
        );
        let len_collector = collector.and_then(|v| v.len());

        let mut acc = (len_collector.supplier)();
        for x in [5, 6, 7] {
            acc = (len_collector.accumulate)(acc, x);
        }

        assert_eq!((len_collector.finish)(acc), 3);
    }
}
