use super::TaskHandle;
use super::priority::Priority;
use super::state::{CANCELLED, COMPLETED, FAILED, NOTIFIED, READY, RUNNING, SUSPENDED};
use super::tree::{NodeKind, TaskNode};
use crate::error::{TaskError, panic_message};
use crate::runtime::context;
use crate::runtime::scheduler::SchedulerHandle;
use crate::runtime::task::waker::make_waker;
use crate::sendable::Sendable;

use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

/// A runnable unit of work that can be executed by the scheduler.
///
/// The `Runnable` trait abstracts the specific return type of a task,
/// allowing the scheduler to manage a heterogeneous collection of tasks and
/// actor drains through `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Executes one slice of work. Called by a worker thread.
    fn run(self: Arc<Self>);
}

type Body<T> = Pin<Box<dyn Future<Output = Result<T, TaskError>> + Send>>;

/// A spawned task managed by the runtime.
///
/// A `Task` is the resumable continuation of a body future plus the
/// bookkeeping around it: its node in the task tree, the slot its outcome is
/// parked in, and the wakers of everyone awaiting it.
pub(crate) struct Task<T> {
    /// The body, dropped as soon as it returns.
    ///
    /// Wrapped in `UnsafeCell` for interior mutability during `poll`. Only the
    /// worker that moved the task to `RUNNING` touches it.
    body: UnsafeCell<Option<Body<T>>>,

    /// Outcome of the body. Readable by handles once the state is terminal.
    pub(crate) result: Mutex<Option<Result<T, TaskError>>>,

    /// The task's node in the task tree; also carries the lifecycle state.
    pub(crate) node: Arc<TaskNode>,

    /// Scheduler used to re-queue the task when it is resumed.
    scheduler: SchedulerHandle,

    /// Wakers of handles (and groups) awaiting this task.
    pub(crate) waiters: Mutex<Vec<Waker>>,

    /// The only handle to this task has been dropped.
    pub(crate) handle_dropped: AtomicBool,

    /// An unobserved failure has already been logged.
    failure_reported: AtomicBool,
}

// Safety: `body` is only accessed by the single worker holding the task in
// the `RUNNING` state; everything else is behind locks or atomics.
unsafe impl<T: Send> Sync for Task<T> {}

impl<T: Sendable> Task<T> {
    /// Creates a new task in the `READY` state.
    pub(crate) fn new<F>(future: F, node: Arc<TaskNode>, scheduler: SchedulerHandle) -> Self
    where
        F: Future<Output = Result<T, TaskError>> + Sendable,
    {
        node.state.store(READY, Ordering::Release);

        Self {
            body: UnsafeCell::new(Some(Box::pin(future))),
            result: Mutex::new(None),
            node,
            scheduler,
            waiters: Mutex::new(Vec::new()),
            handle_dropped: AtomicBool::new(false),
            failure_reported: AtomicBool::new(false),
        }
    }

    /// Runs one slice of the task.
    ///
    /// The task moves to `RUNNING`, its body is polled inside the task
    /// context, and then:
    /// - on `Pending` it parks as `SUSPENDED`, or goes straight back to the
    ///   run queue if it was resumed while running (`NOTIFIED`);
    /// - once the body has returned and every structured child has been
    ///   reaped, it reports its terminal state and wakes its awaiters.
    pub(crate) fn run(self: Arc<Self>) {
        let current = self.node.state.load(Ordering::Acquire);

        if current != READY && current != NOTIFIED {
            return;
        }

        // Transition to RUNNING. This ensures exclusive access to the UnsafeCell.
        if self
            .node
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        let poll = context::enter_task(self.node.clone(), || self.poll_body(&mut cx));

        match poll {
            Poll::Pending => {
                if self
                    .node
                    .state
                    .compare_exchange(RUNNING, SUSPENDED, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // Resumed while running; re-queue right away.
                    self.node.state.store(READY, Ordering::Release);
                    self.scheduler.push(self.node.priority(), self.clone());
                }
            }
            Poll::Ready(()) => self.complete(),
        }
    }

    /// Polls the body if it is still live, then waits for structured children.
    fn poll_body(&self, cx: &mut Context<'_>) -> Poll<()> {
        // Safety: the RUNNING state guarantees that no other thread touches the body.
        let body = unsafe { &mut *self.body.get() };

        if let Some(future) = body.as_mut() {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(cx))) {
                Ok(Poll::Pending) => return Poll::Pending,
                Ok(Poll::Ready(outcome)) => outcome,
                Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
            };

            *body = None;

            if let Err(error) = &outcome
                && !error.is_cancelled()
            {
                tracing::debug!(task = %self.node.id(), %error, "task body failed, cancelling its subtree");
                self.node.cancel_children();
            }

            *self.result.lock() = Some(outcome);
        }

        self.node.poll_children(cx)
    }

    /// Publishes the terminal state, leaves the parent and wakes awaiters.
    fn complete(&self) {
        let terminal = match self.result.lock().as_ref() {
            Some(Ok(_)) => COMPLETED,
            Some(Err(TaskError::Cancelled)) => CANCELLED,
            _ => FAILED,
        };

        self.node.state.store(terminal, Ordering::SeqCst);

        tracing::trace!(task = %self.node.id(), state = ?self.node.state(), "task finished");

        self.node.finish();

        let waiters = mem::take(&mut *self.waiters.lock());
        for waker in waiters {
            waker.wake();
        }

        if terminal == FAILED && self.handle_dropped.load(Ordering::SeqCst) {
            self.report_unobserved();
        }
    }

    /// Signals the task to be rescheduled.
    ///
    /// If the task is `SUSPENDED`, it moves to `READY` and is pushed to the
    /// scheduler. If the task is `RUNNING`, it moves to `NOTIFIED` so it is
    /// re-queued immediately after its current slice.
    pub(crate) fn resume(self: Arc<Self>) {
        loop {
            let state = self.node.state.load(Ordering::Acquire);

            match state {
                SUSPENDED => {
                    if self
                        .node
                        .state
                        .compare_exchange(SUSPENDED, READY, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        let priority = self.node.priority();
                        let scheduler = self.scheduler.clone();
                        scheduler.push(priority, self);
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .node
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already queued, already notified, or finished.
                _ => return,
            }
        }
    }
}

impl<T> Task<T> {
    /// Logs a failure nobody is left to observe.
    pub(crate) fn report_unobserved(&self) {
        if self.failure_reported.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(Err(error)) = self.result.lock().as_ref()
            && !error.is_cancelled()
        {
            tracing::error!(task = %self.node.id(), %error, "task failed and nobody awaited it");
        }
    }
}

impl<T: Sendable> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }
}

/// Creates the task for `node` and queues it.
pub(crate) fn spawn_node<F, T>(
    scheduler: SchedulerHandle,
    node: Arc<TaskNode>,
    future: F,
) -> TaskHandle<T>
where
    F: Future<Output = Result<T, TaskError>> + Sendable,
    T: Sendable,
{
    let priority = node.priority();
    let task = Arc::new(Task::new(future, node, scheduler.clone()));

    tracing::trace!(task = %task.node.id(), ?priority, "spawned");

    scheduler.push(priority, task.clone());

    TaskHandle { task }
}

fn runtime_scheduler() -> SchedulerHandle {
    context::current_scheduler().expect("spawn must be called within the context of a runtime")
}

/// Spawns a structured child of the current task.
///
/// The child inherits the current task's priority and is attached to its
/// node: cancelling the current task cancels the child, and the current task
/// does not report completion before the child is terminal. Called outside of
/// a task (but on a runtime thread), the new task is a root.
///
/// The body reports failure by returning `Err`; `check_cancellation()?`
/// ends it as cancelled.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = task::spawn(async { Ok(21 * 2) });
/// assert_eq!(handle.await?, 42);
/// ```
pub fn spawn<F, T>(future: F) -> TaskHandle<T>
where
    F: Future<Output = Result<T, TaskError>> + Sendable,
    T: Sendable,
{
    let priority = context::current_task().map_or_else(Priority::default, |node| node.priority());
    spawn_with_priority(priority, future)
}

/// Spawns a structured child of the current task in the given priority band.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
pub fn spawn_with_priority<F, T>(priority: Priority, future: F) -> TaskHandle<T>
where
    F: Future<Output = Result<T, TaskError>> + Sendable,
    T: Sendable,
{
    let scheduler = runtime_scheduler();

    let node = match context::current_task() {
        Some(parent) => TaskNode::child_of(&parent, NodeKind::Task, priority),
        None => TaskNode::root(NodeKind::Task, priority),
    };

    spawn_node(scheduler, node, future)
}

/// Spawns a detached task: the root of a new, independent tree.
///
/// A detached task is not cancelled with the task that spawned it and does not
/// hold up that task's completion. If it fails and its handle has been dropped,
/// the failure is logged.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
pub fn spawn_detached<F, T>(future: F) -> TaskHandle<T>
where
    F: Future<Output = Result<T, TaskError>> + Sendable,
    T: Sendable,
{
    let scheduler = runtime_scheduler();
    let priority = context::current_task().map_or_else(Priority::default, |node| node.priority());

    spawn_node(scheduler, TaskNode::root(NodeKind::Task, priority), future)
}

/// Returns the id of the task currently running on this thread.
pub fn current_id() -> Option<super::TaskId> {
    context::current_task().map(|node| node.id())
}
