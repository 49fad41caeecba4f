//! Lazy sequence pipelines.
//!
//! A pipeline is built in three parts: a source ([`Seq::from_vec`],
//! [`Seq::of`], [`Seq::range`], [`Seq::generate`]), a chain of lazy stages
//! (`map`, `filter`, `sorted`, ...) that describe work without doing any,
//! and exactly one terminal operation (`for_each`, `count`, the match
//! family, `reduce`, `collect`) that drives elements through the chain.
//!
//! Sequential evaluation pulls one element at a time through every stage in
//! order, which is what makes short-circuiting terminals stop early.
//! Switching the handle to [`Seq::parallel`] partitions the source across
//! the runtime's worker pool instead and merges per-partition results.

pub mod collector;
pub mod collectors;
pub mod drive;
pub mod pipeline;
pub mod source;
pub mod stage;

pub use collector::Collector;
pub use collectors::SummaryStats;
pub use pipeline::{EvalMode, Seq};
pub use source::{GenerateSource, RangeElement, RangeSource, VecSource};
pub use stage::{Pull, Stage};
