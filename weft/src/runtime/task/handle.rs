use super::id::TaskId;
use super::state::{FAILED, TaskState, is_terminal};
use crate::error::TaskError;
use crate::runtime::task::Task;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::task::{Context, Poll, Waker};

/// A handle to a spawned task.
///
/// Awaiting the handle suspends the caller until the task reaches a terminal
/// state and yields its outcome: the value on success, or the
/// [`TaskError`] it failed with. The outcome is delivered once, to this
/// handle.
///
/// Dropping the handle does **not** cancel the task; it only discards the
/// ability to observe its result. A failure that nobody observes is logged.
pub struct TaskHandle<T> {
    /// Shared reference to the underlying task.
    pub(crate) task: Arc<Task<T>>,
}

impl<T> TaskHandle<T> {
    /// Returns the task's identifier.
    pub fn id(&self) -> TaskId {
        self.task.node.id()
    }

    /// Returns the task's current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.task.node.state()
    }

    /// Returns `true` once the task has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Cancels the task and its whole structured subtree.
    pub fn cancel(&self) {
        self.task.node.cancel();
    }

    /// Returns `true` if the task, or one of its ancestors, was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.task.node.is_cancelled()
    }

    /// Takes the outcome if the task is terminal.
    pub(crate) fn try_take(&self) -> Option<Result<T, TaskError>> {
        if is_terminal(self.task.node.state.load(Ordering::Acquire)) {
            self.task.result.lock().take()
        } else {
            None
        }
    }

    /// Registers `waker` to be woken when the task becomes terminal.
    ///
    /// The waker is registered **before** re-checking the task state, so a
    /// completion racing with the registration is never missed. Returns
    /// `true` if the task was already terminal.
    pub(crate) fn register(&self, waker: &Waker) -> bool {
        if is_terminal(self.task.node.state.load(Ordering::Acquire)) {
            return true;
        }

        self.task.waiters.lock().push(waker.clone());

        is_terminal(self.task.node.state.load(Ordering::Acquire))
    }
}

impl<T> Future for TaskHandle<T> {
    /// The outcome of the spawned task.
    type Output = Result<T, TaskError>;

    /// Polls the handle.
    ///
    /// If the task has already reached a terminal state, its outcome is
    /// returned immediately. Otherwise, the current waker is registered and
    /// the future returns `Poll::Pending`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.register(cx.waker()) {
            let outcome = self
                .task
                .result
                .lock()
                .take()
                .expect("task handle polled after completion");

            return Poll::Ready(outcome);
        }

        Poll::Pending
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.task.handle_dropped.store(true, Ordering::SeqCst);

        if self.task.node.state.load(Ordering::SeqCst) == FAILED {
            self.task.report_unobserved();
        }
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
