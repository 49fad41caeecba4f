//! Lazy pipeline stages.
//!
//! A stage is a pure description: it holds its upstream stage and one
//! closure, and nothing runs until a terminal operation drives the chain.
//! Sequential evaluation composes boxed pull iterators, so stages apply
//! top-to-bottom per element before the next element is pulled. Parallel
//! evaluation composes the per-element fold and delegates partitioning to
//! the source.
//!
//! Closures are captured by move at construction; a stage never sees state
//! mutated behind its back unless the caller reaches for interior
//! mutability.

use crate::error::Result;
use crate::function::{Comparator, Supplier};
use crate::seq::drive::{Driver, FoldFn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

/// Boxed lazy pull over the chain so far. Errors flow as elements so a
/// deferred failure surfaces exactly when its element is reached.
pub type Pull<T> = Box<dyn Iterator<Item = Result<T>> + Send>;

/// One node of a pipeline: a source or a transformation wrapping its
/// upstream. Implementations provide both evaluation drivers; which one runs
/// is decided by the terminal operation's evaluation mode.
pub trait Stage: Send + Sized + 'static {
    type Item: Send + 'static;

    /// Sequential driver: one lazily evaluated pull over the whole chain.
    fn into_pull(self) -> Pull<Self::Item>;

    /// Parallel driver: fold every partition of the source through the
    /// chain, returning partial accumulators in encounter order.
    fn fold_chunks<A>(
        self,
        driver: &Driver,
        make: Supplier<A>,
        fold: FoldFn<A, Self::Item>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static;
}

pub struct Map<S, F> {
    pub(crate) base: S,
    pub(crate) f: F,
}

impl<S, F, R> Stage for Map<S, F>
where
    S: Stage,
    F: Fn(S::Item) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    type Item = R;

    fn into_pull(self) -> Pull<R> {
        let f = self.f;
        Box::new(self.base.into_pull().map(move |r| r.map(&f)))
    }

    fn fold_chunks<A>(self, driver: &Driver, make: Supplier<A>, fold: FoldFn<A, R>) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let f = self.f;
        let fold: FoldFn<A, S::Item> = Arc::new(move |acc, item| fold(acc, f(item)));
        self.base.fold_chunks(driver, make, fold)
    }
}

pub struct Filter<S, P> {
    pub(crate) base: S,
    pub(crate) predicate: P,
}

impl<S, P> Stage for Filter<S, P>
where
    S: Stage,
    P: Fn(&S::Item) -> bool + Send + Sync + 'static,
{
    type Item = S::Item;

    fn into_pull(self) -> Pull<S::Item> {
        let predicate = self.predicate;
        Box::new(self.base.into_pull().filter(move |r| match r {
            Ok(item) => predicate(item),
            Err(_) => true,
        }))
    }

    fn fold_chunks<A>(
        self,
        driver: &Driver,
        make: Supplier<A>,
        fold: FoldFn<A, S::Item>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let predicate = self.predicate;
        let fold: FoldFn<A, S::Item> = Arc::new(move |acc, item| {
            if predicate(&item) {
                fold(acc, item)
            } else {
                Ok(acc)
            }
        });
        self.base.fold_chunks(driver, make, fold)
    }
}

/// Fallible map: the closure's error aborts the terminal operation when the
/// offending element reaches this stage.
pub struct TryMap<S, F> {
    pub(crate) base: S,
    pub(crate) f: F,
}

impl<S, F, R> Stage for TryMap<S, F>
where
    S: Stage,
    F: Fn(S::Item) -> Result<R> + Send + Sync + 'static,
    R: Send + 'static,
{
    type Item = R;

    fn into_pull(self) -> Pull<R> {
        let f = self.f;
        Box::new(self.base.into_pull().map(move |r| r.and_then(&f)))
    }

    fn fold_chunks<A>(self, driver: &Driver, make: Supplier<A>, fold: FoldFn<A, R>) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let f = self.f;
        let fold: FoldFn<A, S::Item> = Arc::new(move |acc, item| fold(acc, f(item)?));
        self.base.fold_chunks(driver, make, fold)
    }
}

/// Fallible filter.
pub struct TryFilter<S, P> {
    pub(crate) base: S,
    pub(crate) predicate: P,
}

impl<S, P> Stage for TryFilter<S, P>
where
    S: Stage,
    P: Fn(&S::Item) -> Result<bool> + Send + Sync + 'static,
{
    type Item = S::Item;

    fn into_pull(self) -> Pull<S::Item> {
        let predicate = self.predicate;
        Box::new(self.base.into_pull().filter_map(move |r| match r {
            Ok(item) => match predicate(&item) {
                Ok(true) => Some(Ok(item)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            },
            Err(e) => Some(Err(e)),
        }))
    }

    fn fold_chunks<A>(
        self,
        driver: &Driver,
        make: Supplier<A>,
        fold: FoldFn<A, S::Item>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let predicate = self.predicate;
        let fold: FoldFn<A, S::Item> = Arc::new(move |acc, item| {
            if predicate(&item)? {
                fold(acc, item)
            } else {
                Ok(acc)
            }
        });
        self.base.fold_chunks(driver, make, fold)
    }
}

/// One-to-many map: each element expands into an iterable spliced into the
/// output in encounter order.
pub struct FlatMap<S, F> {
    pub(crate) base: S,
    pub(crate) f: F,
}

impl<S, F, I, R> Stage for FlatMap<S, F>
where
    S: Stage,
    F: Fn(S::Item) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = R> + 'static,
    I::IntoIter: Send + 'static,
    R: Send + 'static,
{
    type Item = R;

    fn into_pull(self) -> Pull<R> {
        let f = self.f;
        Box::new(self.base.into_pull().flat_map(move |r| -> Pull<R> {
            match r {
                Ok(item) => Box::new(f(item).into_iter().map(Ok)),
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        }))
    }

    fn fold_chunks<A>(self, driver: &Driver, make: Supplier<A>, fold: FoldFn<A, R>) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let f = self.f;
        let fold: FoldFn<A, S::Item> = Arc::new(move |mut acc, item| {
            for sub in f(item) {
                acc = fold(acc, sub)?;
            }
            Ok(acc)
        });
        self.base.fold_chunks(driver, make, fold)
    }
}

/// Pass-through observer for each surviving element.
pub struct Inspect<S, F> {
    pub(crate) base: S,
    pub(crate) f: F,
}

impl<S, F> Stage for Inspect<S, F>
where
    S: Stage,
    F: Fn(&S::Item) + Send + Sync + 'static,
{
    type Item = S::Item;

    fn into_pull(self) -> Pull<S::Item> {
        let f = self.f;
        Box::new(self.base.into_pull().map(move |r| {
            if let Ok(item) = &r {
                f(item);
            }
            r
        }))
    }

    fn fold_chunks<A>(
        self,
        driver: &Driver,
        make: Supplier<A>,
        fold: FoldFn<A, S::Item>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let f = self.f;
        let fold: FoldFn<A, S::Item> = Arc::new(move |acc, item| {
            f(&item);
            fold(acc, item)
        });
        self.base.fold_chunks(driver, make, fold)
    }
}

/// Drops elements already seen. Keeps a set of every value that passed, so
/// memory grows with the number of distinct elements.
pub struct Distinct<S> {
    pub(crate) base: S,
}

impl<S> Stage for Distinct<S>
where
    S: Stage,
    S::Item: Hash + Eq + Clone,
{
    type Item = S::Item;

    fn into_pull(self) -> Pull<S::Item> {
        let mut seen = HashSet::new();
        Box::new(self.base.into_pull().filter(move |r| match r {
            Ok(item) => seen.insert(item.clone()),
            Err(_) => true,
        }))
    }

    fn fold_chunks<A>(
        self,
        driver: &Driver,
        make: Supplier<A>,
        fold: FoldFn<A, S::Item>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        // all-seen set shared across partitions; first arrival wins
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let fold: FoldFn<A, S::Item> = Arc::new(move |acc, item| {
            if seen.lock().insert(item.clone()) {
                fold(acc, item)
            } else {
                Ok(acc)
            }
        });
        self.base.fold_chunks(driver, make, fold)
    }
}

/// Sort stage. Buffers the entire upstream before emitting anything, then
/// yields a new ordered sequence; upstream ties keep their encounter order
/// (stable sort). An upstream error is re-emitted before any sorted output.
pub struct Sorted<S: Stage> {
    pub(crate) base: S,
    pub(crate) cmp: Comparator<S::Item>,
}

impl<S: Stage> Stage for Sorted<S> {
    type Item = S::Item;

    fn into_pull(self) -> Pull<S::Item> {
        Box::new(SortedPull {
            state: SortedState::Pending {
                base: self.base.into_pull(),
                cmp: self.cmp,
            },
        })
    }

    fn fold_chunks<A>(
        self,
        driver: &Driver,
        make: Supplier<A>,
        fold: FoldFn<A, S::Item>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        // materialize upstream first (in partition order), then fan the
        // sorted buffer back out to the pool for the downstream fold
        let buffers: Vec<Vec<S::Item>> = self.base.fold_chunks(
            driver,
            Arc::new(Vec::new),
            Arc::new(|mut buf: Vec<S::Item>, item| {
                buf.push(item);
                Ok(buf)
            }),
        )?;

        let mut items: Vec<S::Item> = buffers.into_iter().flatten().collect();
        let cmp = self.cmp;
        items.sort_by(|a, b| cmp(a, b));

        driver.fold_vec(items, make, fold)
    }
}

enum SortedState<T> {
    Pending { base: Pull<T>, cmp: Comparator<T> },
    Draining(std::vec::IntoIter<T>),
    Done,
}

struct SortedPull<T> {
    state: SortedState<T>,
}

impl<T: Send + 'static> Iterator for SortedPull<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        loop {
            match std::mem::replace(&mut self.state, SortedState::Done) {
                SortedState::Pending { base, cmp } => {
                    let mut buf = Vec::new();
                    for r in base {
                        match r {
                            Ok(item) => buf.push(item),
                            // leave the state Done: one error ends the pull
                            Err(e) => return Some(Err(e)),
                        }
                    }
                    buf.sort_by(|a, b| cmp(a, b));
                    self.state = SortedState::Draining(buf.into_iter());
                }
                SortedState::Draining(mut iter) => {
                    let next = iter.next();
                    self.state = SortedState::Draining(iter);
                    return next.map(Ok);
                }
                SortedState::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::source::VecSource;

    fn source(items: Vec<i32>) -> VecSource<i32> {
        VecSource { items }
    }

    #[test]
    fn test_map_is_lazy_until_pulled() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let applied = Arc::new(AtomicUsize::new(0));
        let applied_clone = applied.clone();

        let stage = Map {
            base: source(vec![1, 2, 3]),
            f: move |x: i32| {
                applied_clone.fetch_add(1, Ordering::Relaxed);
                x * 2
            },
        };

        let mut pull = stage.into_pull();
        assert_eq!(applied.load(Ordering::Relaxed), 0);

        assert_eq!(pull.next().unwrap().unwrap(), 2);
        assert_eq!(applied.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_filter_passes_errors_through() {
        let stage = TryMap {
            base: source(vec![1, 2, 3]),
            f: |x: i32| {
                if x == 2 {
                    Err(crate::Error::element("try_map", "refused 2"))
                } else {
                    Ok(x)
                }
            },
        };
        let filtered = Filter {
            base: stage,
            predicate: |x: &i32| *x > 0,
        };

        let results: Vec<Result<i32>> = filtered.into_pull().collect();
        assert_eq!(results.len(), 3);
        assert!(results[1].is_err());
    }

    #[test]
    fn test_sorted_pull_is_stable() {
        let stage = Sorted {
            base: source(vec![31, 12, 32, 11]),
            // compare by last digit only, so 31/32 and 12/11 tie pairwise
            cmp: Box::new(|a: &i32, b: &i32| (a % 10).cmp(&(b % 10))),
        };

        let items: Vec<i32> = stage.into_pull().map(|r| r.unwrap()).collect();
        assert_eq!(items, vec![31, 11, 12, 32]);
    }

    #[test]
    fn test_sorted_emits_upstream_error_first() {
        let failing = TryMap {
            base: source(vec![2, 1, 3]),
            f: |x: i32| {
                if x == 3 {
                    Err(crate::Error::element("try_map", "bad element"))
                } else {
                    Ok(x)
                }
            },
        };
        let sorted = Sorted {
            base: failing,
            cmp: Box::new(|a: &i32, b: &i32| a.cmp(b)),
        };

        let mut pull = sorted.into_pull();
        assert!(pull.next().unwrap().is_err());
        assert!(pull.next().is_none());
    }

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let stage = Distinct {
            base: source(vec![1, 2, 1, 3, 2]),
        };
        let items: Vec<i32> = stage.into_pull().map(|r| r.unwrap()).collect();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_flat_map_splices_in_order() {
        let stage = FlatMap {
            base: source(vec![1, 2]),
            f: |x: i32| vec![x, x * 10],
        };
        let items: Vec<i32> = stage.into_pull().map(|r| r.unwrap()).collect();
        assert_eq!(items, vec![1, 10, 2, 20]);
    }
}
