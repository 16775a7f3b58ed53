use super::worker::Worker;
use crate::error::BuildError;
use crate::runtime::config::RuntimeConfig;
use crate::runtime::scheduler::SchedulerHandle;

use std::thread::{self, JoinHandle};

/// Fixed pool of worker threads draining a shared scheduler.
///
/// The `Executor` is responsible for:
/// - spawning named worker threads,
/// - signalling shutdown through the scheduler,
/// - joining the workers.
pub(crate) struct Executor {
    scheduler: SchedulerHandle,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,
}

impl Executor {
    /// Starts `config.worker_threads` workers on `scheduler`.
    ///
    /// If a thread cannot be spawned, the workers started so far are stopped
    /// and joined before the error is returned.
    pub(crate) fn start(
        scheduler: SchedulerHandle,
        config: &RuntimeConfig,
    ) -> Result<Self, BuildError> {
        let mut executor = Self {
            scheduler: scheduler.clone(),
            handles: Vec::with_capacity(config.worker_threads),
        };

        for index in 0..config.worker_threads {
            let worker = Worker::new(index, scheduler.clone());

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, index))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => executor.handles.push(handle),
                Err(error) => {
                    executor.shutdown();
                    executor.join();
                    return Err(BuildError::Spawn(error));
                }
            }
        }

        tracing::debug!(workers = config.worker_threads, "executor started");

        Ok(executor)
    }

    /// Signals all workers to shut down once their current runnable returns.
    pub(crate) fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    /// Waits for all worker threads to terminate.
    ///
    /// This should be called after initiating shutdown.
    pub(crate) fn join(&mut self) {
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}
