//! The user-facing pipeline handle and its terminal operations.

use crate::error::{Error, Result};
use crate::function::Supplier;
use crate::seq::collector::Collector;
use crate::seq::drive::{Driver, FoldFn};
use crate::seq::source::{GenerateSource, RangeElement, RangeSource, VecSource};
use crate::seq::stage::{
    Distinct, Filter, FlatMap, Inspect, Map, Sorted, Stage, TryFilter, TryMap,
};
use std::cmp::Ordering as CmpOrdering;
use std::hash::Hash;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a terminal operation drives the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    /// Single-threaded cooperative pull in encounter order.
    #[default]
    Sequential,
    /// Partitioned folds on the runtime's worker pool.
    Parallel,
}

/// A one-shot lazy pipeline over elements of `S::Item`.
///
/// Stage methods wrap the chain without consuming any data; exactly one
/// terminal operation may drive it. A second terminal call reports
/// [`Error::AlreadyConsumed`]; rebuild the pipeline from a factory closure
/// to evaluate the same shape again:
///
/// ```
/// use rill::Seq;
///
/// let evens = || Seq::range(0i32..10).filter(|x| x % 2 == 0);
/// assert_eq!(evens().count().unwrap(), 5);
/// assert!(evens().any_match(|x| *x == 4).unwrap());
/// ```
pub struct Seq<S: Stage> {
    inner: Option<S>,
    mode: EvalMode,
}

impl<T: Send + 'static> Seq<VecSource<T>> {
    /// Pipeline over an owned vector.
    pub fn from_vec(items: Vec<T>) -> Self {
        Seq::with_source(VecSource { items })
    }

    /// Pipeline over an explicit element list (arrays included).
    pub fn of(items: impl Into<Vec<T>>) -> Self {
        Self::from_vec(items.into())
    }

    /// Pipeline over any iterable, materialized up front.
    pub fn from_iter(items: impl IntoIterator<Item = T>) -> Self {
        Self::from_vec(items.into_iter().collect())
    }

    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl<T: RangeElement> Seq<RangeSource<T>> {
    /// Pipeline over a half-open numeric range.
    pub fn range(range: Range<T>) -> Self {
        Seq::with_source(RangeSource { range })
    }
}

impl<T: Send + 'static> Seq<GenerateSource<T>> {
    /// Infinite pipeline producing elements from the supplier on demand.
    /// Pair with a short-circuiting terminal operation.
    pub fn generate(supplier: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Seq::with_source(GenerateSource {
            supplier: Arc::new(supplier),
        })
    }
}

impl<S: Stage> Seq<S> {
    fn with_source(stage: S) -> Self {
        Seq {
            inner: Some(stage),
            mode: EvalMode::Sequential,
        }
    }

    fn wrap<S2: Stage>(self, f: impl FnOnce(S) -> S2) -> Seq<S2> {
        Seq {
            inner: self.inner.map(f),
            mode: self.mode,
        }
    }

    fn take_stage(&mut self) -> Result<S> {
        self.inner.take().ok_or(Error::AlreadyConsumed)
    }

    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    /// Evaluate terminal operations on the runtime's worker pool.
    pub fn parallel(mut self) -> Self {
        self.mode = EvalMode::Parallel;
        self
    }

    /// Evaluate terminal operations on the calling thread (the default).
    pub fn sequential(mut self) -> Self {
        self.mode = EvalMode::Sequential;
        self
    }

    // ---- intermediate stages -------------------------------------------

    pub fn map<F, R>(self, f: F) -> Seq<Map<S, F>>
    where
        F: Fn(S::Item) -> R + Send + Sync + 'static,
        R: Send + 'static,
    {
        self.wrap(|base| Map { base, f })
    }

    pub fn filter<P>(self, predicate: P) -> Seq<Filter<S, P>>
    where
        P: Fn(&S::Item) -> bool + Send + Sync + 'static,
    {
        self.wrap(|base| Filter { base, predicate })
    }

    /// Fallible map: a returned error aborts the terminal operation when the
    /// offending element reaches this stage.
    pub fn try_map<F, R>(self, f: F) -> Seq<TryMap<S, F>>
    where
        F: Fn(S::Item) -> Result<R> + Send + Sync + 'static,
        R: Send + 'static,
    {
        self.wrap(|base| TryMap { base, f })
    }

    /// Fallible filter.
    pub fn try_filter<P>(self, predicate: P) -> Seq<TryFilter<S, P>>
    where
        P: Fn(&S::Item) -> Result<bool> + Send + Sync + 'static,
    {
        self.wrap(|base| TryFilter { base, predicate })
    }

    pub fn flat_map<F, I, R>(self, f: F) -> Seq<FlatMap<S, F>>
    where
        F: Fn(S::Item) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = R> + 'static,
        I::IntoIter: Send + 'static,
        R: Send + 'static,
    {
        self.wrap(|base| FlatMap { base, f })
    }

    /// Observe each surviving element without changing it.
    pub fn inspect<F>(self, f: F) -> Seq<Inspect<S, F>>
    where
        F: Fn(&S::Item) + Send + Sync + 'static,
    {
        self.wrap(|base| Inspect { base, f })
    }

    /// Drop elements already seen earlier in the sequence.
    pub fn distinct(self) -> Seq<Distinct<S>>
    where
        S::Item: Hash + Eq + Clone,
    {
        self.wrap(|base| Distinct { base })
    }

    /// Sort by natural order. Buffers the entire upstream; stable.
    pub fn sorted(self) -> Seq<Sorted<S>>
    where
        S::Item: Ord,
    {
        self.sorted_by(|a, b| a.cmp(b))
    }

    /// Sort by a comparator. Buffers the entire upstream; stable.
    pub fn sorted_by(
        self,
        cmp: impl Fn(&S::Item, &S::Item) -> CmpOrdering + Send + Sync + 'static,
    ) -> Seq<Sorted<S>> {
        self.wrap(|base| Sorted {
            base,
            cmp: Box::new(cmp),
        })
    }

    /// Sort by a key projection. Buffers the entire upstream; stable.
    pub fn sorted_by_key<K: Ord>(
        self,
        key: impl Fn(&S::Item) -> K + Send + Sync + 'static,
    ) -> Seq<Sorted<S>> {
        self.sorted_by(move |a, b| key(a).cmp(&key(b)))
    }

    // ---- terminal operations -------------------------------------------

    /// Run `action` once per surviving element. Encounter order
    /// sequentially; unspecified order in parallel mode.
    pub fn for_each<F>(&mut self, action: F) -> Result<()>
    where
        F: Fn(S::Item) + Send + Sync + 'static,
    {
        let stage = self.take_stage()?;
        match self.mode {
            EvalMode::Sequential => {
                for r in stage.into_pull() {
                    action(r?);
                }
                Ok(())
            }
            EvalMode::Parallel => {
                let driver = Driver::current()?;
                let action = Arc::new(action);
                let fold: FoldFn<(), S::Item> = Arc::new(move |(), item| {
                    action(item);
                    Ok(())
                });
                stage.fold_chunks(&driver, Arc::new(|| ()), fold)?;
                Ok(())
            }
        }
    }

    /// Number of elements surviving all stages.
    pub fn count(&mut self) -> Result<usize> {
        let stage = self.take_stage()?;
        match self.mode {
            EvalMode::Sequential => {
                let mut n = 0;
                for r in stage.into_pull() {
                    r?;
                    n += 1;
                }
                Ok(n)
            }
            EvalMode::Parallel => {
                let driver = Driver::current()?;
                let fold: FoldFn<usize, S::Item> = Arc::new(|n, _| Ok(n + 1));
                let parts = stage.fold_chunks(&driver, Arc::new(|| 0), fold)?;
                Ok(parts.into_iter().sum())
            }
        }
    }

    /// True if any element matches. Stops pulling at the first match.
    pub fn any_match<P>(&mut self, predicate: P) -> Result<bool>
    where
        P: Fn(&S::Item) -> bool + Send + Sync + 'static,
    {
        let stage = self.take_stage()?;
        match self.mode {
            EvalMode::Sequential => {
                for r in stage.into_pull() {
                    if predicate(&r?) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            EvalMode::Parallel => {
                let driver = Driver::current()?;
                let found = Arc::new(AtomicBool::new(false));
                let flag = found.clone();
                let cancel = driver.cancel_handle();
                let fold: FoldFn<(), S::Item> = Arc::new(move |(), item| {
                    if !flag.load(Ordering::Relaxed) && predicate(&item) {
                        flag.store(true, Ordering::Relaxed);
                        cancel.store(true, Ordering::Relaxed);
                    }
                    Ok(())
                });
                stage.fold_chunks(&driver, Arc::new(|| ()), fold)?;
                Ok(found.load(Ordering::Relaxed))
            }
        }
    }

    /// True if every element matches. Stops pulling at the first mismatch.
    pub fn all_match<P>(&mut self, predicate: P) -> Result<bool>
    where
        P: Fn(&S::Item) -> bool + Send + Sync + 'static,
    {
        self.any_match(move |item| !predicate(item)).map(|b| !b)
    }

    /// True if no element matches. Stops pulling at the first match.
    pub fn none_match<P>(&mut self, predicate: P) -> Result<bool>
    where
        P: Fn(&S::Item) -> bool + Send + Sync + 'static,
    {
        self.any_match(predicate).map(|b| !b)
    }

    /// First surviving element in encounter order, if any.
    pub fn find_first(&mut self) -> Result<Option<S::Item>> {
        let stage = self.take_stage()?;
        match self.mode {
            EvalMode::Sequential => stage.into_pull().next().transpose(),
            EvalMode::Parallel => {
                let driver = Driver::current()?;
                let fold: FoldFn<Option<S::Item>, S::Item> =
                    Arc::new(|acc, item| Ok(acc.or(Some(item))));
                let parts = stage.fold_chunks(&driver, Arc::new(|| None), fold)?;
                Ok(parts.into_iter().flatten().next())
            }
        }
    }

    /// Fold all elements starting from `identity`. Under parallel
    /// evaluation each partition starts from a clone of `identity` and the
    /// partials merge through `combiner` in encounter order; `combiner` must
    /// be equivalent to repeated `accumulator` application for the two modes
    /// to agree.
    pub fn reduce<A, F, C>(&mut self, identity: A, accumulator: F, combiner: C) -> Result<A>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, S::Item) -> A + Send + Sync + 'static,
        C: Fn(A, A) -> A + Send + Sync + 'static,
    {
        let stage = self.take_stage()?;
        match self.mode {
            EvalMode::Sequential => {
                let mut acc = identity;
                for r in stage.into_pull() {
                    acc = accumulator(acc, r?);
                }
                Ok(acc)
            }
            EvalMode::Parallel => {
                let driver = Driver::current()?;
                let seed = identity.clone();
                let make: Supplier<A> = Arc::new(move || seed.clone());
                let fold: FoldFn<A, S::Item> = Arc::new(move |acc, item| Ok(accumulator(acc, item)));
                let parts = stage.fold_chunks(&driver, make, fold)?;
                Ok(parts
                    .into_iter()
                    .reduce(|a, b| combiner(a, b))
                    .unwrap_or(identity))
            }
        }
    }

    /// Accumulate all elements through a [`Collector`]: one accumulator
    /// sequentially, one per partition merged via `combine` in encounter
    /// order under parallel evaluation, `finish` applied exactly once.
    pub fn collect<A, R>(&mut self, collector: Collector<S::Item, A, R>) -> Result<R>
    where
        A: Send + 'static,
        R: 'static,
    {
        let stage = self.take_stage()?;
        let Collector {
            supplier,
            accumulate,
            combine,
            finish,
        } = collector;

        match self.mode {
            EvalMode::Sequential => {
                let mut acc = supplier();
                for r in stage.into_pull() {
                    acc = accumulate(acc, r?);
                }
                Ok(finish(acc))
            }
            EvalMode::Parallel => {
                let driver = Driver::current()?;
                let fold: FoldFn<A, S::Item> = {
                    let accumulate = accumulate.clone();
                    Arc::new(move |acc, item| Ok(accumulate(acc, item)))
                };
                let parts = stage.fold_chunks(&driver, supplier.clone(), fold)?;
                let merged = parts
                    .into_iter()
                    .reduce(|a, b| combine(a, b))
                    .unwrap_or_else(|| supplier());
                Ok(finish(merged))
            }
        }
    }
}
