//! rill - lazy sequence pipelines
//!
//! A small library for building lazy, one-shot sequence pipelines: chain
//! `map`/`filter`/`sorted` stages over a source, then drive them with a
//! terminal operation such as `count`, `reduce`, or `collect`. Evaluation is
//! pull-based and short-circuiting by default; flipping the handle to
//! parallel mode partitions the source across a work-stealing worker pool
//! and merges per-partition results through the collector's combine step.
//!
//! # Quick Start
//!
//! ```
//! use rill::prelude::*;
//!
//! let result = Seq::of(["d2", "a2", "b1", "a1"])
//!     .filter(|s| s.starts_with('a'))
//!     .map(|s| s.to_uppercase())
//!     .collect(collectors::to_vec())
//!     .unwrap();
//!
//! assert_eq!(result, vec!["A2", "A1"]);
//! ```
//!
//! Parallel evaluation needs an initialized runtime:
//!
//! ```no_run
//! use rill::prelude::*;
//!
//! rill::init().unwrap();
//!
//! let sum = Seq::range(0i32..1000)
//!     .parallel()
//!     .reduce(0, |acc, x| acc + x, |a, b| a + b)
//!     .unwrap();
//!
//! assert_eq!(sum, 499500);
//! rill::shutdown();
//! ```
//!
//! # Features
//!
//! - **Lazy stages**: nothing runs until a terminal operation drives the
//!   chain; stages apply per element, top to bottom
//! - **Short-circuiting**: `any_match`/`all_match`/`none_match` and
//!   `find_first` stop pulling as soon as the answer is known
//! - **Pluggable collectors**: supplier/accumulate/combine/finish strategies
//!   plus a library of built-ins
//! - **Parallel evaluation**: partitioned folds on a work-stealing pool,
//!   merged in encounter order
//! - **One-shot pipelines**: a second terminal operation reports an error
//!   instead of silently returning nothing

pub mod config;
pub mod error;
pub mod executor;
pub mod function;
pub mod prelude;
pub mod runtime;
pub mod seq;
pub mod telemetry;
pub mod util;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use seq::{Collector, EvalMode, Seq};
pub use runtime::{init, init_with_config, shutdown};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::collectors;

    #[test]
    fn test_basic_sequential_pipeline() {
        let squares = Seq::range(1i32..6)
            .map(|x| x * x)
            .collect(collectors::to_vec())
            .unwrap();

        assert_eq!(squares, vec![1, 4, 9, 16, 25]);
    }

    #[test]
    fn test_basic_parallel_sum() {
        runtime::init_thread_local().unwrap();

        let sum = Seq::range(0i32..100)
            .parallel()
            .reduce(0, |acc, x| acc + x, |a, b| a + b)
            .unwrap();
        assert_eq!(sum, 4950);

        shutdown();
    }

    #[test]
    fn test_parallel_for_each_counts_all() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        runtime::init_thread_local().unwrap();

        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = seen.clone();

        Seq::range(0i32..50)
            .parallel()
            .for_each(move |_| {
                *seen_clone.lock() += 1;
            })
            .unwrap();

        assert_eq!(*seen.lock(), 50);

        shutdown();
    }
}
