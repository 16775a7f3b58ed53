//! # Weft
//!
//! **Weft** is a structured-concurrency runtime for Rust: a small core that
//! schedules cooperative tasks on a pool of worker threads, keeps them in a
//! parent/child tree, and serializes access to shared mutable state through
//! actors.
//!
//! It offers:
//!
//! - A **priority scheduler** with one FIFO band per [`task::Priority`]
//! - **Structured tasks**: children are cancelled with their parent, and a
//!   parent does not finish before its children do
//! - **Task groups** collecting a dynamic set of children in completion order,
//!   cancelling the siblings of the first child that fails
//! - **Cooperative cancellation**, observed with [`task::check_cancellation`]
//! - **Actors** owning their state behind a FIFO mailbox
//! - A **sendability discipline** checked at compile time (see [`sendable`])
//! - **Ergonomic macros** `#[weft::main]` and `#[weft::test]`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weft::actor::Actor;
//! use weft::error::TaskError;
//! use weft::task;
//!
//! #[weft::main]
//! async fn main() {
//!     let hits = Actor::new(0u64);
//!
//!     let total = task::with_task_group(|group| {
//!         for _ in 0..8 {
//!             let hits = hits.clone();
//!             group.add_task(async move {
//!                 hits.call(|n| *n += 1).await.map_err(TaskError::failed)?;
//!                 Ok(())
//!             });
//!         }
//!     })
//!     .await
//!     .map(|done| done.len());
//!
//!     println!("{total:?} tasks, {} hits", hits.call(|n| *n).await.unwrap());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`task`]: Spawning, handles, task groups and cancellation
//! - [`actor`]: Actors and their calls
//! - [`sendable`]: The sendability marker and its explicit override
//! - [`error`]: Error types
//!
//! ## Getting Started
//!
//! Add Weft to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! weft = { git = "https://github.com/Nebula-ecosystem/weft", package = "weft" }
//! ```

mod runtime;

pub mod actor;
pub mod error;
pub mod sendable;

pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::config::RuntimeConfig;
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use weft_macros::*;
