use crate::runtime::context::enter_scheduler;
use crate::runtime::scheduler::SchedulerHandle;

/// A worker thread in the executor.
///
/// A worker repeatedly pops the next runnable from the highest non-empty
/// priority band and runs one slice of it, parking inside the scheduler when
/// every band is empty.
pub(crate) struct Worker {
    /// Index of the worker within the pool.
    index: usize,

    scheduler: SchedulerHandle,
}

impl Worker {
    pub(crate) fn new(index: usize, scheduler: SchedulerHandle) -> Self {
        Self { index, scheduler }
    }

    /// Runs the worker loop until the scheduler shuts down.
    ///
    /// The scheduler is installed as the thread's runtime context for the
    /// whole loop, so runnables can spawn tasks and call actors.
    pub(crate) fn run(self) {
        tracing::trace!(worker = self.index, "worker started");

        enter_scheduler(self.scheduler.clone(), || {
            while let Some(runnable) = self.scheduler.pop() {
                runnable.run();
            }
        });

        tracing::trace!(worker = self.index, "worker stopped");
    }
}
