//! Tasks, the task tree, task groups and cooperative cancellation.
//!
//! This module defines the user-facing side of the scheduler:
//! - [`spawn`], [`spawn_with_priority`] and [`spawn_detached`] create tasks,
//! - [`TaskHandle`] awaits a task's outcome and cancels its subtree,
//! - [`TaskGroup`] and [`with_task_group`] run a dynamic set of children,
//! - [`is_cancelled`] and [`check_cancellation`] observe cancellation.
//!
//! Every task body returns `Result<T, TaskError>`. Structured children are
//! attached to the task that spawned them: they are cancelled with it, and it
//! does not report completion before they are terminal.

mod cancel;
mod core;
mod group;
mod handle;
mod id;
mod priority;
mod state;
mod tree;
mod waker;

pub(crate) use self::core::{Runnable, Task, spawn_node};
pub(crate) use tree::{NodeKind, TaskNode};

pub use cancel::{cancel, check_cancellation, is_cancelled};
pub use self::core::{current_id, spawn, spawn_detached, spawn_with_priority};
pub use group::{TaskGroup, with_task_group};
pub use handle::TaskHandle;
pub use id::TaskId;
pub use priority::Priority;
pub use state::TaskState;
