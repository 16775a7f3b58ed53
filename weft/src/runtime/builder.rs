use super::Runtime;
use super::config::{RuntimeConfig, apply_env_overrides};
use crate::error::BuildError;

/// Builder for configuring and creating a runtime.
///
/// Values set on the builder take precedence over environment overrides
/// loaded with [`from_env`](Self::from_env), which take precedence over the
/// defaults of [`RuntimeConfig`], whatever order the calls are made in.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .from_env()?
///     .worker_threads(4)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuntimeBuilder {
    /// Defaults, possibly overridden by the environment.
    base: RuntimeConfig,

    worker_threads: Option<usize>,
    thread_name_prefix: Option<String>,
    actor_batch: Option<usize>,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// By default, the number of worker threads is set to the number
    /// of available logical CPUs, falling back to `1` if unavailable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the `WEFT_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidEnv`] if a variable is set to a value
    /// that cannot be parsed.
    pub fn from_env(mut self) -> Result<Self, BuildError> {
        apply_env_overrides(&mut self.base)?;
        Ok(self)
    }

    /// Sets the number of worker threads used by the runtime.
    ///
    /// Zero is rejected by [`build`](Self::build).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let builder = RuntimeBuilder::new()
    ///     .worker_threads(2);
    /// ```
    pub fn worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = Some(n);
        self
    }

    /// Sets the prefix worker threads are named with.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = Some(prefix.into());
        self
    }

    /// Sets how many mailbox entries an actor handles before it yields its
    /// worker. Zero is rejected by [`build`](Self::build).
    pub fn actor_batch(mut self, n: usize) -> Self {
        self.actor_batch = Some(n);
        self
    }

    /// Resolves the configuration without starting anything.
    pub fn config(&self) -> RuntimeConfig {
        let mut config = self.base.clone();

        if let Some(n) = self.worker_threads {
            config.worker_threads = n;
        }

        if let Some(prefix) = &self.thread_name_prefix {
            config.thread_name_prefix = prefix.clone();
        }

        if let Some(n) = self.actor_batch {
            config.actor_batch = n;
        }

        config
    }

    /// Builds the runtime with the configured options and starts its
    /// workers.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the configuration is invalid or a worker
    /// thread cannot be spawned.
    pub fn build(self) -> Result<Runtime, BuildError> {
        Runtime::start(self.config())
    }
}
