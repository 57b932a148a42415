//! Worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment key for [`WorkerPoolConfig::instance_name`].
pub const ENV_INSTANCE_NAME: &str = "SCHEDULER_INSTANCE_NAME";
/// Environment key for [`WorkerPoolConfig::instance_id`].
pub const ENV_INSTANCE_ID: &str = "SCHEDULER_INSTANCE_ID";
/// Environment key for [`WorkerPoolConfig::worker_thread_count`].
pub const ENV_THREAD_COUNT: &str = "SCHEDULER_THREAD_COUNT";
/// Environment key for [`WorkerPoolConfig::make_threads_daemons`].
pub const ENV_THREADS_DAEMON: &str = "SCHEDULER_THREADS_DAEMON";
/// Environment key for [`WorkerPoolConfig::make_dispatch_thread_daemon`].
pub const ENV_DISPATCH_THREAD_DAEMON: &str = "SCHEDULER_DISPATCH_THREAD_DAEMON";
/// Environment key for [`WorkerPoolConfig::shutdown_poll_interval_ms`].
pub const ENV_SHUTDOWN_POLL_INTERVAL_MS: &str = "SCHEDULER_SHUTDOWN_POLL_INTERVAL_MS";
/// Environment key for [`WorkerPoolConfig::shutdown_poll_attempts`].
pub const ENV_SHUTDOWN_POLL_ATTEMPTS: &str = "SCHEDULER_SHUTDOWN_POLL_ATTEMPTS";

/// Configuration of a [`WorkerPool`](crate::core::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Scheduler instance name; every pool thread name contains it.
    pub instance_name: String,
    /// Scheduler instance id.
    pub instance_id: String,
    /// Number of worker threads.
    pub worker_thread_count: usize,
    /// Whether worker threads are daemons (detached, never joined on drop).
    pub make_threads_daemons: bool,
    /// Whether the dispatch thread is a daemon.
    pub make_dispatch_thread_daemon: bool,
    /// Worker stack size in bytes; platform default when `None`.
    pub thread_stack_size: Option<usize>,
    /// Interval between live-thread checks during shutdown.
    pub shutdown_poll_interval_ms: u64,
    /// Maximum number of live-thread checks during shutdown.
    pub shutdown_poll_attempts: u32,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            instance_name: "ActionScheduler".into(),
            instance_id: "NON_CLUSTERED".into(),
            worker_thread_count: num_cpus::get(),
            make_threads_daemons: true,
            make_dispatch_thread_daemon: true,
            thread_stack_size: None,
            shutdown_poll_interval_ms: 1000,
            shutdown_poll_attempts: 30,
        }
    }
}

impl WorkerPoolConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instance name.
    #[must_use]
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    /// Set the instance id.
    #[must_use]
    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = id.into();
        self
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_thread_count(mut self, count: usize) -> Self {
        self.worker_thread_count = count;
        self
    }

    /// Set the daemon flag of worker threads.
    #[must_use]
    pub const fn with_threads_daemons(mut self, daemon: bool) -> Self {
        self.make_threads_daemons = daemon;
        self
    }

    /// Set the daemon flag of the dispatch thread.
    #[must_use]
    pub const fn with_dispatch_thread_daemon(mut self, daemon: bool) -> Self {
        self.make_dispatch_thread_daemon = daemon;
        self
    }

    /// Set the worker stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Set the shutdown polling budget.
    #[must_use]
    pub const fn with_shutdown_poll(mut self, interval_ms: u64, attempts: u32) -> Self {
        self.shutdown_poll_interval_ms = interval_ms;
        self.shutdown_poll_attempts = attempts;
        self
    }

    /// Interval between live-thread checks during shutdown.
    #[must_use]
    pub const fn shutdown_poll_interval(&self) -> Duration {
        Duration::from_millis(self.shutdown_poll_interval_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// A description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.instance_name.trim().is_empty() {
            return Err("instance_name must not be empty".into());
        }
        if self.worker_thread_count == 0 {
            return Err("worker_thread_count must be greater than 0".into());
        }
        if self.shutdown_poll_attempts == 0 {
            return Err("shutdown_poll_attempts must be greater than 0".into());
        }
        if self.thread_stack_size == Some(0) {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first if one exists. Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Unparsable values or validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the
    /// `SCHEDULER_*` keys. Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Unparsable values or validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_INSTANCE_NAME) {
            cfg.instance_name = v;
        }
        if let Some(v) = lookup(ENV_INSTANCE_ID) {
            cfg.instance_id = v;
        }
        if let Some(v) = lookup(ENV_THREAD_COUNT) {
            cfg.worker_thread_count = parse(ENV_THREAD_COUNT, &v)?;
        }
        if let Some(v) = lookup(ENV_THREADS_DAEMON) {
            cfg.make_threads_daemons = parse(ENV_THREADS_DAEMON, &v)?;
        }
        if let Some(v) = lookup(ENV_DISPATCH_THREAD_DAEMON) {
            cfg.make_dispatch_thread_daemon = parse(ENV_DISPATCH_THREAD_DAEMON, &v)?;
        }
        if let Some(v) = lookup(ENV_SHUTDOWN_POLL_INTERVAL_MS) {
            cfg.shutdown_poll_interval_ms = parse(ENV_SHUTDOWN_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_SHUTDOWN_POLL_ATTEMPTS) {
            cfg.shutdown_poll_attempts = parse(ENV_SHUTDOWN_POLL_ATTEMPTS, &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{key}: cannot parse `{value}`: {e}"))
}
