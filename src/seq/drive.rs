//! Parallel evaluation plumbing: partitioned folds on the worker pool.
//!
//! A terminal operation running in parallel mode builds one [`Driver`],
//! composes the stage chain into a single per-element fold, and asks the
//! source to split itself into partitions. Each partition folds into its own
//! accumulator on a pool worker; the driving thread merges the partials in
//! partition order, so encounter order survives for order-sensitive merges.

use crate::error::{Error, Result};
use crate::executor::{panic_message, CpuPool};
use crate::function::Supplier;
use crate::runtime;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Composed per-element fold, shared by all partitions.
pub type FoldFn<A, T> = Arc<dyn Fn(A, T) -> Result<A> + Send + Sync>;

/// One parallel drive: the pool plus a cancellation flag shared by every
/// partition. The flag is set by the first failure or by a short-circuiting
/// terminal; running partitions observe it between elements and stop.
pub struct Driver {
    pool: Arc<CpuPool>,
    cancel: Arc<AtomicBool>,
}

impl Driver {
    pub(crate) fn current() -> Result<Self> {
        let rt = runtime::try_current()?;
        Ok(Self {
            pool: rt.pool.clone(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub(crate) fn workers(&self) -> usize {
        self.pool.num_threads()
    }

    pub(crate) fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Partition length for a source of `len` elements.
    pub(crate) fn partition_size(&self, len: usize) -> usize {
        let workers = self.workers().max(1);
        ((len + workers - 1) / workers).max(1)
    }

    /// Fold an owned vector chunk-wise; partial accumulators come back in
    /// partition (encounter) order.
    pub(crate) fn fold_vec<A, T>(
        &self,
        items: Vec<T>,
        make: Supplier<A>,
        fold: FoldFn<A, T>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static,
        T: Send + 'static,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.partition_size(items.len());
        let mut parts = Vec::new();
        let mut rest = items;
        while rest.len() > chunk_size {
            let tail = rest.split_off(chunk_size);
            parts.push(rest);
            rest = tail;
        }
        parts.push(rest);

        self.fold_partitions(parts, make, fold)
    }

    /// Fold pre-split partitions concurrently. Results come back indexed by
    /// partition, first failure wins and cancels the rest.
    pub(crate) fn fold_partitions<A, T, I>(
        &self,
        parts: Vec<I>,
        make: Supplier<A>,
        fold: FoldFn<A, T>,
    ) -> Result<Vec<A>>
    where
        A: Send + 'static,
        T: Send + 'static,
        I: IntoIterator<Item = T> + Send + 'static,
    {
        let n = parts.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        tracing::debug!(partitions = n, "parallel drive");

        let (tx, rx) = crossbeam_channel::unbounded::<(usize, Result<A>)>();

        for (idx, part) in parts.into_iter().enumerate() {
            let tx = tx.clone();
            let make = make.clone();
            let fold = fold.clone();
            let cancel = self.cancel.clone();

            self.pool.execute(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    let mut acc = make();
                    for item in part {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                        acc = fold(acc, item)?;
                    }
                    Ok(acc)
                }));

                let result = match outcome {
                    Ok(result) => result,
                    Err(payload) => Err(Error::WorkerPanic(panic_message(payload))),
                };

                if result.is_err() {
                    cancel.store(true, Ordering::Relaxed);
                }
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<A>> = Vec::with_capacity(n);
        slots.resize_with(n, || None);
        let mut first_err: Option<Error> = None;

        for _ in 0..n {
            match rx.recv() {
                Ok((idx, Ok(acc))) => slots[idx] = Some(acc),
                Ok((_, Err(e))) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(_) => {
                    if first_err.is_none() {
                        first_err = Some(Error::executor("worker result channel closed"));
                    }
                    break;
                }
            }
        }

        if let Some(e) = first_err {
            return Err(e);
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| Error::executor("missing partition result")))
            .collect()
    }
}
