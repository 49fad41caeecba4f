//! Sequence sources: fixed collections, numeric ranges, generators.

use crate::error::Result;
use crate::function::Supplier;
use crate::seq::drive::{Driver, FoldFn};
use crate::seq::stage::{Pull, Stage};
use std::ops::Range;

/// Element types usable with numeric range sources: the arithmetic needed to
/// iterate a range and split it into per-worker partitions.
pub trait RangeElement: Copy + Ord + Send + 'static {
    fn span(start: Self, end: Self) -> usize;
    fn offset(self, n: usize) -> Self;
    fn successor(self) -> Self;
}

macro_rules! impl_range_element {
    ($($ty:ty),*) => {$(
        impl RangeElement for $ty {
            fn span(start: Self, end: Self) -> usize {
                if end > start { (end - start) as usize } else { 0 }
            }

            fn offset(self, n: usize) -> Self {
                self + n as $ty
            }

            fn successor(self) -> Self {
                self + 1
            }
        }
    )*};
}

impl_range_element!(i32, i64, u32, u64, usize);

/// Source backed by an owned vector. Construction copies nothing further;
/// the backing collection the caller started from is never mutated.
pub struct VecSource<T> {
    pub(crate) items: Vec<T>,
}

impl<T: Send + 'static> Stage for VecSource<T> {
    type Item = T;

    fn into_pull(self) -> Pull<T> {
        Box::new(self.items.into_iter().map(Ok))
    }

    fn fold_chunks<A>(self, driver: &Driver, make: Supplier<A>, fold: FoldFn<A, T>) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        driver.fold_vec(self.items, make, fold)
    }
}

/// Source over a half-open numeric range, partitioned arithmetically in
/// parallel mode so the range is never materialized.
pub struct RangeSource<T> {
    pub(crate) range: Range<T>,
}

fn range_pull<T: RangeElement>(start: T, end: T) -> impl Iterator<Item = T> + Send {
    let first = if start < end { Some(start) } else { None };
    std::iter::successors(first, move |&cur| {
        let next = cur.successor();
        if next < end {
            Some(next)
        } else {
            None
        }
    })
}

impl<T: RangeElement> Stage for RangeSource<T> {
    type Item = T;

    fn into_pull(self) -> Pull<T> {
        let Range { start, end } = self.range;
        Box::new(range_pull(start, end).map(Ok))
    }

    fn fold_chunks<A>(self, driver: &Driver, make: Supplier<A>, fold: FoldFn<A, T>) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let Range { start, end } = self.range;
        let len = T::span(start, end);
        if len == 0 {
            return Ok(Vec::new());
        }

        let chunk_size = driver.partition_size(len);
        let mut parts: Vec<Box<dyn Iterator<Item = T> + Send>> = Vec::new();
        let mut lo = 0usize;
        while lo < len {
            let hi = (lo + chunk_size).min(len);
            parts.push(Box::new(range_pull(start.offset(lo), start.offset(hi))));
            lo = hi;
        }

        driver.fold_partitions(parts, make, fold)
    }
}

/// Infinite source producing elements from a supplier on demand.
///
/// Generators cannot be partitioned, so parallel terminals fold them on the
/// driving thread with sequential semantics; only short-circuiting terminals
/// can complete against one.
pub struct GenerateSource<T> {
    pub(crate) supplier: Supplier<T>,
}

impl<T: Send + 'static> Stage for GenerateSource<T> {
    type Item = T;

    fn into_pull(self) -> Pull<T> {
        let supplier = self.supplier;
        Box::new(std::iter::repeat_with(move || Ok(supplier())))
    }

    fn fold_chunks<A>(self, driver: &Driver, make: Supplier<A>, fold: FoldFn<A, T>) -> Result<Vec<A>>
    where
        A: Send + 'static,
    {
        let supplier = self.supplier;
        let mut acc = make();
        while !driver.cancelled() {
            acc = fold(acc, supplier())?;
        }
        Ok(vec![acc])
    }
}
