/// Task is parked at a suspension point, waiting to be resumed.
pub(crate) const SUSPENDED: u8 = 0;

/// Task is queued for execution.
///
/// The task has been scheduled and is waiting in a run queue.
pub(crate) const READY: u8 = 1;

/// Task is currently being executed by a worker.
///
/// At most one worker may observe this state at a time.
pub(crate) const RUNNING: u8 = 2;

/// Task has been resumed while running.
///
/// It goes straight back to the run queue once the current slice ends.
pub(crate) const NOTIFIED: u8 = 3;

/// Terminal: the body returned `Ok`.
pub(crate) const COMPLETED: u8 = 4;

/// Terminal: the body stopped after observing cancellation.
pub(crate) const CANCELLED: u8 = 5;

/// Terminal: the body returned an error or panicked.
pub(crate) const FAILED: u8 = 6;

/// Observable lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Parked at a suspension point.
    Suspended,
    /// Waiting in the run queue.
    Ready,
    /// Being polled by a worker.
    Running,
    /// Finished with a value.
    Completed,
    /// Finished after observing cancellation.
    Cancelled,
    /// Finished with an error or a panic.
    Failed,
}

impl TaskState {
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            SUSPENDED => Self::Suspended,
            READY => Self::Ready,
            RUNNING | NOTIFIED => Self::Running,
            COMPLETED => Self::Completed,
            CANCELLED => Self::Cancelled,
            _ => Self::Failed,
        }
    }

    /// Returns `true` once the task can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

pub(crate) fn is_terminal(raw: u8) -> bool {
    raw >= COMPLETED
}
