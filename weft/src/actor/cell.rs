use super::ActorId;
use crate::runtime::context;
use crate::runtime::scheduler::SchedulerHandle;
use crate::runtime::task::{Priority, Runnable};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A mailbox entry. Runs with exclusive access to the actor's state.
pub(crate) type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Shared body of an actor: its private state and its mailbox.
pub(crate) struct ActorCell<S> {
    pub(crate) id: ActorId,

    /// Drains are queued in this band.
    pub(crate) priority: Priority,

    /// Only ever locked by the single live drain.
    state: Mutex<S>,

    mailbox: Mutex<Mailbox<S>>,
}

struct Mailbox<S> {
    jobs: VecDeque<Job<S>>,

    /// A drain is queued or running. At most one exists at a time.
    scheduled: bool,
}

impl<S: Send + 'static> ActorCell<S> {
    pub(crate) fn new(state: S, priority: Priority) -> Self {
        Self {
            id: ActorId::next(),
            priority,
            state: Mutex::new(state),
            mailbox: Mutex::new(Mailbox {
                jobs: VecDeque::new(),
                scheduled: false,
            }),
        }
    }

    /// Appends `job` to the mailbox and queues a drain on `scheduler` if none
    /// is queued or running.
    pub(crate) fn enqueue(self: &Arc<Self>, scheduler: &SchedulerHandle, job: Job<S>) {
        let schedule = {
            let mut mailbox = self.mailbox.lock();
            mailbox.jobs.push_back(job);
            !mem::replace(&mut mailbox.scheduled, true)
        };

        if schedule {
            self.schedule(scheduler.clone());
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.mailbox.lock().jobs.len()
    }

    fn schedule(self: &Arc<Self>, scheduler: SchedulerHandle) {
        let drain = Arc::new(Drain {
            cell: self.clone(),
            scheduler: scheduler.clone(),
            ran: AtomicBool::new(false),
        });

        scheduler.push(self.priority, drain);
    }

    /// Runs up to `batch` jobs in mailbox order.
    ///
    /// Returns `true` if jobs are left, in which case the caller queues the
    /// next drain. Otherwise the `scheduled` flag has been cleared.
    fn drain(&self, batch: usize) -> bool {
        let mut state = self.state.lock();
        let mut handled = 0;

        let exhausted = context::enter_actor(self.id, || {
            while handled < batch {
                let job = {
                    let mut mailbox = self.mailbox.lock();
                    match mailbox.jobs.pop_front() {
                        Some(job) => job,
                        None => {
                            mailbox.scheduled = false;
                            return false;
                        }
                    }
                };

                job(&mut *state);
                handled += 1;
            }

            true
        });

        drop(state);

        tracing::trace!(actor = %self.id, handled, "actor drained");

        if !exhausted {
            return false;
        }

        let mut mailbox = self.mailbox.lock();
        if mailbox.jobs.is_empty() {
            mailbox.scheduled = false;
            return false;
        }

        true
    }
}

impl<S> ActorCell<S> {
    /// Drops every queued job after the drain itself was discarded.
    fn abandon(&self) {
        let jobs = {
            let mut mailbox = self.mailbox.lock();
            mailbox.scheduled = false;
            mem::take(&mut mailbox.jobs)
        };

        if !jobs.is_empty() {
            tracing::debug!(actor = %self.id, dropped = jobs.len(), "actor mailbox abandoned");
        }

        // Outside the lock: dropping a job resolves its caller.
        drop(jobs);
    }
}

/// The runnable that drains an actor's mailbox on a worker.
struct Drain<S> {
    cell: Arc<ActorCell<S>>,
    scheduler: SchedulerHandle,
    ran: AtomicBool,
}

impl<S: Send + 'static> Runnable for Drain<S> {
    fn run(self: Arc<Self>) {
        self.ran.store(true, Ordering::Release);

        if self.cell.drain(self.scheduler.actor_batch()) {
            self.cell.schedule(self.scheduler.clone());
        }
    }
}

impl<S> Drop for Drain<S> {
    /// A drain that is dropped without having run was discarded by a
    /// scheduler that shut down. Its jobs can never run.
    fn drop(&mut self) {
        if !self.ran.load(Ordering::Acquire) {
            self.cell.abandon();
        }
    }
}
