//! Core runtime components.
//!
//! This module contains the fundamental building blocks of the runtime:
//! the shared priority run queue, the worker threads draining it, the
//! per-thread execution context and cooperative yielding.
//!
//! It is responsible for:
//! - executing tasks and actor drains on a fixed pool of workers,
//! - keeping the structured task tree consistent,
//! - enabling cooperative multitasking via yielding.
//!
//! Most users will interact with [`Runtime`], [`RuntimeBuilder`] and the
//! [`task`] module rather than with these components directly.
//!
//! [`RuntimeBuilder`]: builder::RuntimeBuilder

mod core;
mod executor;

pub(crate) mod builder;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod scheduler;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
