use crate::actor::ActorId;
use crate::runtime::scheduler::SchedulerHandle;
use crate::runtime::task::TaskNode;

use std::cell::{Cell, RefCell};
use std::sync::Arc;

thread_local! {
    /// Thread-local handle to the scheduler of the runtime driving this thread.
    ///
    /// Set for the lifetime of every worker thread, so that `spawn` and actor
    /// calls can reach the run queue without explicit parameter passing.
    pub(crate) static CURRENT_SCHEDULER: RefCell<Option<SchedulerHandle>> =
        const { RefCell::new(None) };

    /// Tree node of the task currently being polled on this thread.
    pub(crate) static CURRENT_TASK: RefCell<Option<Arc<TaskNode>>> =
        const { RefCell::new(None) };

    /// Actor whose mailbox entry is currently executing on this thread.
    pub(crate) static CURRENT_ACTOR: Cell<Option<ActorId>> = const { Cell::new(None) };
}

/// Enters the runtime execution context for the current thread.
///
/// The scheduler handle is installed for the duration of `f` and the previous
/// one is restored afterwards.
pub(crate) fn enter_scheduler<R>(scheduler: SchedulerHandle, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_SCHEDULER.with(|s| s.replace(Some(scheduler)));
    let out = f();
    CURRENT_SCHEDULER.with(|s| s.replace(prev));
    out
}

/// Marks `node` as the running task for the duration of `f`.
pub(crate) fn enter_task<R>(node: Arc<TaskNode>, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_TASK.with(|t| t.replace(Some(node)));
    let out = f();
    CURRENT_TASK.with(|t| t.replace(prev));
    out
}

/// Marks `actor` as executing on this thread for the duration of `f`.
pub(crate) fn enter_actor<R>(actor: ActorId, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_ACTOR.with(|a| a.replace(Some(actor)));
    let out = f();
    CURRENT_ACTOR.with(|a| a.set(prev));
    out
}

pub(crate) fn current_scheduler() -> Option<SchedulerHandle> {
    CURRENT_SCHEDULER.with(|s| s.borrow().clone())
}

pub(crate) fn current_task() -> Option<Arc<TaskNode>> {
    CURRENT_TASK.with(|t| t.borrow().clone())
}

pub(crate) fn current_actor() -> Option<ActorId> {
    CURRENT_ACTOR.with(Cell::get)
}
