//! Worker pool.
//!
//! This module contains the threads that execute runnables:
//! - [`core`]: spawns the pool and manages its lifecycle,
//! - [`worker`]: the loop each thread runs.
//!
//! Workers share one [`Scheduler`](crate::runtime::scheduler::Scheduler); there
//! is no per-worker queue and no thread affinity, so a task may resume on any
//! worker.

pub(crate) mod core;
pub(crate) mod worker;
