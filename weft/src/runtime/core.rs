use super::config::RuntimeConfig;
use super::context;
use super::executor::core::Executor;
use super::scheduler::{Scheduler, SchedulerHandle};
use super::task::{NodeKind, Priority, TaskHandle, TaskNode, spawn_node};
use crate::error::{BuildError, TaskError};
use crate::sendable::Sendable;

use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - owning the priority run queue and the worker pool draining it,
/// - spawning root tasks from outside the runtime,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime stops the workers, discards whatever is still
/// queued, and joins the worker threads.
pub struct Runtime {
    /// Worker pool driving the scheduler.
    executor: Executor,

    scheduler: SchedulerHandle,

    config: RuntimeConfig,
}

impl Runtime {
    /// Starts a runtime from a validated configuration.
    pub(crate) fn start(config: RuntimeConfig) -> Result<Self, BuildError> {
        config.validate()?;

        let scheduler = Arc::new(Scheduler::new(config.actor_batch));
        let executor = Executor::start(scheduler.clone(), &config)?;

        tracing::debug!(?config, "runtime started");

        Ok(Self {
            executor,
            scheduler,
            config,
        })
    }

    /// Spawns a root task in the given priority band.
    ///
    /// The task starts a new tree: it has no parent and nothing but its own
    /// handle can cancel it.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(Priority::High, async { Ok(42) });
    /// ```
    pub fn spawn<F, T>(&self, priority: Priority, future: F) -> TaskHandle<T>
    where
        F: Future<Output = Result<T, TaskError>> + Sendable,
        T: Sendable,
    {
        spawn_node(
            self.scheduler.clone(),
            TaskNode::root(NodeKind::Task, priority),
            future,
        )
    }

    /// Runs a future to completion as a root task, blocking the current
    /// thread.
    ///
    /// This method is typically used as the synchronous entry point of the
    /// runtime (e.g. in `main` or tests). The future runs on the worker
    /// pool, in the [`Normal`](Priority::Normal) band, and may spawn
    /// structured children: `block_on` returns once they have finished too.
    ///
    /// # Panics
    ///
    /// Panics if the future panics, re-raising its message on the calling
    /// thread, and if called from a worker thread of a runtime.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Sendable,
        F::Output: Sendable,
    {
        assert!(
            context::current_scheduler().is_none(),
            "block_on cannot be called from a runtime worker thread"
        );

        let handle = self.spawn(Priority::Normal, async move { Ok(future.await) });

        match wait(handle) {
            Ok(output) => output,
            Err(error) => panic!("{error}"),
        }
    }

    /// Returns the configuration the runtime was started with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime.
    ///
    /// This performs the following steps:
    /// 1. Stops the scheduler, discarding queued runnables and waking every
    ///    parked worker
    /// 2. Joins all worker threads
    fn drop(&mut self) {
        self.executor.shutdown();
        self.executor.join();

        tracing::debug!("runtime stopped");
    }
}

/// Waker that unparks the thread blocked in [`wait`].
struct ThreadWaker(Thread);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

/// Parks the current thread until `handle` resolves.
fn wait<T>(handle: TaskHandle<T>) -> Result<T, TaskError> {
    let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);
    let mut handle = pin!(handle);

    loop {
        match handle.as_mut().poll(&mut cx) {
            Poll::Ready(outcome) => return outcome,
            Poll::Pending => thread::park(),
        }
    }
}
