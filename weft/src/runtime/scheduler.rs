use crate::runtime::task::{Priority, Runnable};

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Shared handle to the scheduler.
pub(crate) type SchedulerHandle = Arc<Scheduler>;

/// Run queue shared by every worker of a runtime.
///
/// Ready runnables (tasks and actor drains) are kept in one FIFO band per
/// [`Priority`]. Workers pop from the highest non-empty band and park on a
/// condition variable when every band is empty.
pub(crate) struct Scheduler {
    /// Bands and lifecycle flags, guarded together so that parking can never
    /// miss a push.
    queue: Mutex<RunQueue>,

    /// Condition variable used to wake parked workers.
    condvar: Condvar,

    /// Maximum number of mailbox entries an actor handles per drain.
    actor_batch: usize,
}

struct RunQueue {
    bands: [VecDeque<Arc<dyn Runnable>>; Priority::BANDS],

    /// Number of parked worker threads.
    parked: usize,

    /// Indicates whether the runtime is shutting down.
    shutdown: bool,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub(crate) fn new(actor_batch: usize) -> Self {
        Self {
            queue: Mutex::new(RunQueue {
                bands: Default::default(),
                parked: 0,
                shutdown: false,
            }),
            condvar: Condvar::new(),
            actor_batch,
        }
    }

    pub(crate) fn actor_batch(&self) -> usize {
        self.actor_batch
    }

    /// Enqueues a ready runnable at the back of its priority band.
    ///
    /// Runnables pushed after shutdown are dropped.
    pub(crate) fn push(&self, priority: Priority, runnable: Arc<dyn Runnable>) {
        let mut queue = self.queue.lock();

        if queue.shutdown {
            drop(queue);
            drop(runnable);
            return;
        }

        queue.bands[priority.band()].push_back(runnable);

        if queue.parked > 0 {
            self.condvar.notify_one();
        }
    }

    /// Pops the next runnable, parking the calling worker until one is
    /// available.
    ///
    /// Returns `None` once the scheduler has been shut down.
    pub(crate) fn pop(&self) -> Option<Arc<dyn Runnable>> {
        let mut queue = self.queue.lock();

        loop {
            if queue.shutdown {
                return None;
            }

            if let Some(runnable) = queue.pop_highest() {
                return Some(runnable);
            }

            queue.parked += 1;
            self.condvar.wait(&mut queue);
            queue.parked -= 1;
        }
    }

    /// Stops the scheduler and wakes every parked worker.
    ///
    /// Queued runnables are discarded. They are dropped after the lock is
    /// released because dropping a task may drop wakers that push again.
    pub(crate) fn shutdown(&self) {
        let drained: Vec<Arc<dyn Runnable>> = {
            let mut queue = self.queue.lock();
            queue.shutdown = true;
            queue.bands.iter_mut().flat_map(|band| band.drain(..)).collect()
        };

        self.condvar.notify_all();

        tracing::debug!(discarded = drained.len(), "scheduler shut down");
        drop(drained);
    }
}

impl RunQueue {
    fn pop_highest(&mut self) -> Option<Arc<dyn Runnable>> {
        self.bands.iter_mut().find_map(|band| band.pop_front())
    }
}
