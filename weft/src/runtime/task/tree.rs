use super::cancel::CancellationFlag;
use super::id::TaskId;
use super::priority::Priority;
use super::state::{SUSPENDED, TaskState};

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};

/// What a node stands for in the task tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Task,
    Group,
}

/// A node of the structured task tree.
///
/// Every task owns one node, and so does every task group. A node holds the
/// cancellation flag for its subtree, a weak link to its parent and strong
/// links to its live structured children.
///
/// Children are removed ("reaped") from their parent's list once they are
/// finished and have no live children of their own. A task does not report a
/// terminal state until its own list is empty.
pub(crate) struct TaskNode {
    id: TaskId,
    kind: NodeKind,
    priority: Priority,
    flag: CancellationFlag,
    parent: Option<Weak<TaskNode>>,

    /// Raw task state, see [`super::state`].
    pub(crate) state: AtomicU8,

    children: Mutex<Children>,

    /// Set once the node has been removed from its parent.
    reaped: AtomicBool,
}

struct Children {
    nodes: Vec<Arc<TaskNode>>,

    /// Waker of the owner waiting for `nodes` to drain.
    waiter: Option<Waker>,

    /// The owner is done with its own work.
    finished: bool,
}

impl TaskNode {
    /// Creates a node with no parent.
    pub(crate) fn root(kind: NodeKind, priority: Priority) -> Arc<Self> {
        Arc::new(Self::new(kind, priority, None))
    }

    /// Creates a node attached under `parent`.
    ///
    /// A child attached to an already cancelled parent starts cancelled.
    pub(crate) fn child_of(parent: &Arc<Self>, kind: NodeKind, priority: Priority) -> Arc<Self> {
        let node = Arc::new(Self::new(kind, priority, Some(Arc::downgrade(parent))));

        parent.children.lock().nodes.push(node.clone());

        if parent.flag.is_set() {
            node.cancel();
        }

        node
    }

    fn new(kind: NodeKind, priority: Priority, parent: Option<Weak<Self>>) -> Self {
        Self {
            id: TaskId::next(),
            kind,
            priority,
            flag: CancellationFlag::new(),
            parent,
            state: AtomicU8::new(SUSPENDED),
            children: Mutex::new(Children {
                nodes: Vec::new(),
                waiter: None,
                finished: false,
            }),
            reaped: AtomicBool::new(false),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Sets the flag on this node and on every node below it.
    ///
    /// Flags only ever travel downward. A node that was already flagged has
    /// already flagged its subtree, and later children inherit the flag when
    /// they attach, so the walk stops there.
    pub(crate) fn cancel(&self) {
        if !self.flag.set() {
            return;
        }

        tracing::debug!(node = %self.id, kind = ?self.kind, "cancelled");

        let children = self.children.lock().nodes.clone();
        for child in children {
            child.cancel();
        }
    }

    /// Cancels every live child without flagging this node itself.
    pub(crate) fn cancel_children(&self) {
        let children = self.children.lock().nodes.clone();
        for child in children {
            child.cancel();
        }
    }

    /// Returns `true` if this node or any ancestor has been cancelled.
    pub(crate) fn is_cancelled(&self) -> bool {
        if self.flag.is_set() {
            return true;
        }

        let mut parent = self.parent.as_ref().and_then(Weak::upgrade);
        while let Some(node) = parent {
            if node.flag.is_set() {
                return true;
            }
            parent = node.parent.as_ref().and_then(Weak::upgrade);
        }

        false
    }

    /// Resolves once every structured child has been reaped.
    ///
    /// The waker is registered under the same lock that reaping takes, so a
    /// child finishing concurrently cannot be missed.
    pub(crate) fn poll_children(&self, cx: &mut Context<'_>) -> Poll<()> {
        let mut children = self.children.lock();

        if children.nodes.is_empty() {
            children.waiter = None;
            return Poll::Ready(());
        }

        children.waiter = Some(cx.waker().clone());
        Poll::Pending
    }

    /// Marks the owner as done. The node leaves its parent as soon as it has
    /// no live children.
    pub(crate) fn finish(&self) {
        let empty = {
            let mut children = self.children.lock();
            children.finished = true;
            children.nodes.is_empty()
        };

        if empty {
            self.detach();
        }
    }

    fn reap_child(&self, id: TaskId) {
        let (waiter, detach) = {
            let mut children = self.children.lock();
            children.nodes.retain(|c| c.id != id);

            if children.nodes.is_empty() {
                (children.waiter.take(), children.finished)
            } else {
                (None, false)
            }
        };

        tracing::trace!(parent = %self.id, child = %id, "reaped");

        if let Some(waker) = waiter {
            waker.wake();
        }

        if detach {
            self.detach();
        }
    }

    fn detach(&self) {
        if self.reaped.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            parent.reap_child(self.id);
        }
    }
}
