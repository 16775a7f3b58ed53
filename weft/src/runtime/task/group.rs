use super::core::spawn_node;
use super::id::TaskId;
use super::priority::Priority;
use super::state::TaskState;
use super::tree::{NodeKind, TaskNode};
use super::TaskHandle;
use crate::error::{GroupError, TaskError};
use crate::runtime::context;
use crate::runtime::scheduler::SchedulerHandle;
use crate::sendable::Sendable;

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::{Future, poll_fn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Wake, Waker};
use std::thread;

/// A dynamic set of structured child tasks with join/collect semantics.
///
/// A `TaskGroup` owns its own node in the task tree, attached under the task
/// that created it; every child added to the group is attached under that
/// node. Results are handed out in **completion** order, not submission
/// order.
///
/// Failure policy: the first child that fails cancels all of its siblings
/// and is reported once, by [`next`](Self::next) or
/// [`await_all`](Self::await_all). Later sibling failures are discarded.
/// Children that end cancelled yield no result.
///
/// A group must be drained before it goes out of scope. Dropping it while
/// children are outstanding cancels them and is treated as a fatal programming
/// error inside a task (the enclosing task fails with a panic).
///
/// # Examples
///
/// ```rust,ignore
/// let mut group = TaskGroup::new();
/// for url in urls {
///     group.add_task(async move { fetch(url).await.map_err(TaskError::failed) });
/// }
/// let pages = group.await_all().await?;
/// ```
pub struct TaskGroup<T> {
    /// The group's node in the task tree.
    node: Arc<TaskNode>,

    /// Handles of every child, in submission order.
    children: Vec<TaskHandle<T>>,

    /// Completion queue fed by per-child wakers.
    signal: Arc<GroupSignal>,

    /// Children whose outcome has not been collected yet.
    remaining: usize,

    /// The first child failure has already been reported.
    failed: bool,

    scheduler: SchedulerHandle,
}

impl<T: Sendable> TaskGroup<T> {
    /// Creates an empty group under the current task.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a running runtime.
    pub fn new() -> Self {
        let scheduler = context::current_scheduler()
            .expect("task groups must be created within the context of a runtime");

        let node = match context::current_task() {
            Some(parent) => TaskNode::child_of(&parent, NodeKind::Group, parent.priority()),
            None => TaskNode::root(NodeKind::Group, Priority::default()),
        };

        Self {
            signal: Arc::new(GroupSignal::new(node.clone())),
            node,
            children: Vec::new(),
            remaining: 0,
            failed: false,
            scheduler,
        }
    }

    /// Spawns `work` as a child of the group, in the group's priority band.
    ///
    /// Children may be added at any time while the group is alive. A child
    /// added after the group was cancelled starts out cancelled.
    pub fn add_task<F>(&mut self, work: F) -> TaskId
    where
        F: Future<Output = Result<T, TaskError>> + Sendable,
    {
        self.add_task_with_priority(self.node.priority(), work)
    }

    /// Spawns `work` as a child of the group in the given priority band.
    pub fn add_task_with_priority<F>(&mut self, priority: Priority, work: F) -> TaskId
    where
        F: Future<Output = Result<T, TaskError>> + Sendable,
    {
        let node = TaskNode::child_of(&self.node, NodeKind::Task, priority);
        let handle = spawn_node(self.scheduler.clone(), node, work);
        let id = handle.id();

        let waker = Waker::from(Arc::new(ChildWaker {
            index: self.children.len(),
            child: handle.task.node.clone(),
            fired: AtomicBool::new(false),
            signal: self.signal.clone(),
        }));

        if handle.register(&waker) {
            waker.wake();
        }

        self.children.push(handle);
        self.remaining += 1;

        id
    }

    /// Waits for the next child to finish and returns its result.
    ///
    /// Returns `None` once every child has been collected. Cancelled children
    /// are skipped. The first failure is returned as `Some(Err(_))` after the
    /// siblings have been cancelled; later failures are skipped.
    pub async fn next(&mut self) -> Option<Result<T, GroupError>> {
        poll_fn(|cx| self.poll_next(cx)).await
    }

    fn poll_next(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T, GroupError>>> {
        loop {
            let Some(index) = self.signal.pop_or_register(cx.waker()) else {
                return if self.remaining == 0 {
                    Poll::Ready(None)
                } else {
                    Poll::Pending
                };
            };

            self.remaining -= 1;

            let child = &self.children[index];
            let Some(outcome) = child.try_take() else {
                continue;
            };

            match outcome {
                Ok(value) => return Poll::Ready(Some(Ok(value))),
                Err(TaskError::Cancelled) => continue,
                Err(error) if self.failed => {
                    tracing::warn!(
                        group = %self.node.id(),
                        task = %child.id(),
                        %error,
                        "suppressed failure of task group child"
                    );
                }
                Err(error) => {
                    self.failed = true;

                    return Poll::Ready(Some(Err(GroupError {
                        task: child.id(),
                        source: error,
                    })));
                }
            }
        }
    }

    /// Waits until every child is terminal and returns the successful
    /// results in completion order.
    ///
    /// If a child fails, its siblings are cancelled, the remaining children
    /// are still waited for, and the first failure is returned.
    pub async fn await_all(&mut self) -> Result<Vec<T>, GroupError> {
        let mut values = Vec::with_capacity(self.remaining);
        let mut first_failure = None;

        while let Some(outcome) = self.next().await {
            match outcome {
                Ok(value) => values.push(value),
                Err(error) => first_failure = Some(error),
            }
        }

        match first_failure {
            Some(error) => Err(error),
            None => Ok(values),
        }
    }
}

impl<T> TaskGroup<T> {
    /// Cancels every child, present and future.
    pub fn cancel_all(&self) {
        self.node.cancel();
    }

    /// Returns `true` if the group, or the task that owns it, was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.node.is_cancelled()
    }

    /// Number of children whose outcome has not been collected yet.
    pub fn len(&self) -> usize {
        self.remaining
    }

    /// Returns `true` if every child has been collected.
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Returns the state of the child with the given id.
    pub fn child_state(&self, id: TaskId) -> Option<TaskState> {
        self.children
            .iter()
            .find(|child| child.id() == id)
            .map(TaskHandle::state)
    }
}

impl<T: Sendable> Default for TaskGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for TaskGroup<T> {
    /// Closes the group node.
    ///
    /// Outstanding children are cancelled but stay attached to the tree, so
    /// the enclosing task still waits for them before it reports.
    fn drop(&mut self) {
        if self.remaining > 0 {
            self.node.cancel();

            tracing::error!(
                group = %self.node.id(),
                outstanding = self.remaining,
                "task group dropped without being awaited"
            );

            self.node.finish();

            if !thread::panicking() && context::current_task().is_some() {
                panic!("task group dropped without being awaited");
            }

            return;
        }

        self.node.finish();
    }
}

/// Creates a task group, lets `body` add children to it, then waits for all
/// of them.
///
/// # Examples
///
/// ```rust,ignore
/// let squares = with_task_group(|group| {
///     for i in 0..10u64 {
///         group.add_task(async move { Ok(i * i) });
///     }
/// })
/// .await?;
/// ```
pub async fn with_task_group<T, F>(body: F) -> Result<Vec<T>, GroupError>
where
    T: Sendable,
    F: FnOnce(&mut TaskGroup<T>),
{
    let mut group = TaskGroup::new();
    body(&mut group);
    group.await_all().await
}

struct GroupSignal {
    /// The group's node, cancelled as soon as a child fails.
    group: Arc<TaskNode>,

    /// A child failure has already cancelled the group.
    tripped: AtomicBool,

    state: Mutex<SignalState>,
}

#[derive(Default)]
struct SignalState {
    /// Child indices in the order the children finished.
    completed: VecDeque<usize>,
    waker: Option<Waker>,
}

impl GroupSignal {
    fn new(group: Arc<TaskNode>) -> Self {
        Self {
            group,
            tripped: AtomicBool::new(false),
            state: Mutex::new(SignalState::default()),
        }
    }

    /// Cancels the siblings of a child that just failed, once per group.
    fn trip(&self, failed: &TaskNode) {
        if !self.tripped.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                group = %self.group.id(),
                task = %failed.id(),
                "task group child failed, cancelling siblings"
            );
            self.group.cancel();
        }
    }

    fn push(&self, index: usize) {
        let waker = {
            let mut state = self.state.lock();
            state.completed.push_back(index);
            state.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn pop_or_register(&self, waker: &Waker) -> Option<usize> {
        let mut state = self.state.lock();

        match state.completed.pop_front() {
            Some(index) => Some(index),
            None => {
                state.waker = Some(waker.clone());
                None
            }
        }
    }
}

/// Waker registered on a child's task; records the child's completion.
struct ChildWaker {
    index: usize,
    child: Arc<TaskNode>,
    fired: AtomicBool,
    signal: Arc<GroupSignal>,
}

impl Wake for ChildWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        if !self.fired.swap(true, Ordering::AcqRel) {
            if self.child.state() == TaskState::Failed {
                self.signal.trip(&self.child);
            }
            self.signal.push(self.index);
        }
    }
}
