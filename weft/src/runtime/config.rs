//! Runtime configuration and environment overrides.
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. values set on [`RuntimeBuilder`](crate::RuntimeBuilder),
//! 2. environment variables, when [`RuntimeBuilder::from_env`] is used,
//! 3. the defaults of [`RuntimeConfig::default`].
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `WEFT_WORKER_THREADS` | `usize` | `worker_threads` |
//! | `WEFT_THREAD_NAME_PREFIX` | `String` | `thread_name_prefix` |
//! | `WEFT_ACTOR_BATCH` | `usize` | `actor_batch` |
//!
//! [`RuntimeBuilder::from_env`]: crate::RuntimeBuilder::from_env

use crate::error::BuildError;

use std::env;
use std::thread;

/// Environment variable name for the worker thread count.
pub const ENV_WORKER_THREADS: &str = "WEFT_WORKER_THREADS";
/// Environment variable name for the worker thread name prefix.
pub const ENV_THREAD_NAME_PREFIX: &str = "WEFT_THREAD_NAME_PREFIX";
/// Environment variable name for the actor drain batch size.
pub const ENV_ACTOR_BATCH: &str = "WEFT_ACTOR_BATCH";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of worker threads polling tasks.
    pub worker_threads: usize,

    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,

    /// Maximum number of mailbox entries an actor handles before it yields
    /// its worker back to the scheduler.
    pub actor_batch: usize,
}

impl Default for RuntimeConfig {
    /// One worker per logical CPU (falling back to `1`), the `weft-worker`
    /// prefix, and batches of 64 actor messages.
    fn default() -> Self {
        Self {
            worker_threads: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            thread_name_prefix: "weft-worker".to_string(),
            actor_batch: 64,
        }
    }
}

impl RuntimeConfig {
    /// Checks that the configuration can start a runtime.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.worker_threads == 0 {
            return Err(BuildError::ZeroWorkers);
        }

        if self.actor_batch == 0 {
            return Err(BuildError::ZeroActorBatch);
        }

        Ok(())
    }
}

/// Applies the environment overrides that are set to `config`.
///
/// Returns an error if a variable is set but cannot be parsed.
pub(crate) fn apply_env_overrides(config: &mut RuntimeConfig) -> Result<(), BuildError> {
    apply_overrides(config, |var| env::var(var).ok())
}

fn apply_overrides(
    config: &mut RuntimeConfig,
    lookup: impl Fn(&'static str) -> Option<String>,
) -> Result<(), BuildError> {
    if let Some(value) = lookup(ENV_WORKER_THREADS) {
        config.worker_threads = parse_usize(ENV_WORKER_THREADS, value)?;
    }

    if let Some(value) = lookup(ENV_THREAD_NAME_PREFIX) {
        config.thread_name_prefix = value;
    }

    if let Some(value) = lookup(ENV_ACTOR_BATCH) {
        config.actor_batch = parse_usize(ENV_ACTOR_BATCH, value)?;
    }

    Ok(())
}

fn parse_usize(var: &'static str, value: String) -> Result<usize, BuildError> {
    value
        .trim()
        .parse()
        .map_err(|_| BuildError::InvalidEnv { var, value })
}
