//! Task execution infrastructure.
//!
//! This module provides the worker threads, task queues, and the CPU thread
//! pool that back parallel pipeline evaluation.

pub mod cpu_pool;
pub mod panic_handler;
pub mod task;
pub mod worker;

pub use cpu_pool::CpuPool;
pub use task::TaskId;

pub(crate) use panic_handler::panic_message;
pub(crate) use task::Task;
