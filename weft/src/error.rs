//! Error types shared by the runtime.
//!
//! Errors bubble to the nearest awaiter:
//!
//! - [`CancellationError`] is what a task observes when it checks a cancelled flag,
//! - [`TaskError`] is what awaiting a [`TaskHandle`](crate::task::TaskHandle) yields,
//! - [`GroupError`] carries the first child failure out of a task group,
//! - [`ActorError`] is delivered to the caller of a failed actor call,
//! - [`BuildError`] rejects an invalid runtime configuration.
//!
//! Values that are not [`Sendable`](crate::sendable::Sendable) never reach the
//! scheduler: that rejection is a compile error, so it has no runtime type here.

use crate::task::TaskId;

use std::error::Error as StdError;
use std::io;

/// Boxed error carried by a failed task.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Returned by [`check_cancellation`](crate::task::check_cancellation) when the
/// current task, or one of its ancestors, has been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task was cancelled")]
pub struct CancellationError;

/// Why a task did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task observed cancellation and stopped.
    #[error("task was cancelled")]
    Cancelled,

    /// The task body returned an error.
    #[error("task failed: {0}")]
    Failed(#[source] BoxError),

    /// The task body panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Wraps an arbitrary error as a task failure.
    pub fn failed<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Failed(Box::new(error))
    }

    /// Returns `true` for [`TaskError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<CancellationError> for TaskError {
    fn from(_: CancellationError) -> Self {
        Self::Cancelled
    }
}

/// The first failure reported by a child of a [`TaskGroup`](crate::task::TaskGroup).
///
/// Siblings are cancelled as soon as this error is produced and any later
/// sibling failures are discarded.
#[derive(Debug, thiserror::Error)]
#[error("child {task} of task group failed")]
pub struct GroupError {
    /// The child that failed first.
    pub task: TaskId,

    /// What the child failed with.
    #[source]
    pub source: TaskError,
}

impl GroupError {
    /// Consumes the group error and returns the child's own error.
    pub fn into_inner(self) -> TaskError {
        self.source
    }
}

/// Failure of a single actor call.
///
/// The actor stays usable after any of these; only the caller sees the error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// The handler panicked while running on the actor.
    #[error("actor handler panicked: {0}")]
    HandlerPanicked(String),

    /// The call was issued from inside a handler of the same actor.
    ///
    /// A handler already holds the state as `&mut S`. Logic shared between
    /// handlers belongs in plain `fn(&mut S)` helpers that the handler calls
    /// directly.
    #[error("actor called itself from inside one of its own handlers")]
    Reentrant,

    /// The call was issued outside of a running runtime.
    #[error("actor call issued outside of a runtime")]
    NoRuntime,

    /// The runtime dropped the message before it was handled.
    #[error("actor message dropped before it was handled")]
    Dropped,
}

/// Invalid runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// `worker_threads` was zero.
    #[error("worker_threads must be > 0")]
    ZeroWorkers,

    /// `actor_batch` was zero.
    #[error("actor_batch must be > 0")]
    ZeroActorBatch,

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread")]
    Spawn(#[from] io::Error),
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
