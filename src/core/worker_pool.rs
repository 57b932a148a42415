//! Fixed-size worker pool that executes dispatched invocations.
//!
//! The pool owns one dispatch thread and `worker_thread_count` worker
//! threads, all named after the scheduler instance. The trigger engine hands
//! fire events to [`WorkerPool::dispatch`]; the dispatch thread passes each
//! invoker to an idle worker, which runs it and reports an
//! [`ActionResult`](crate::core::ActionResult) through the returned
//! [`RunHandle`] and the pool's audit sink.
//!
//! # Lifecycle
//!
//! `Created → Started → ShuttingDown → Stopped`. Shutdown never interrupts a
//! running action. It stops accepting work, drops work still queued, then
//! polls the thread registry at a fixed interval until every pool thread has
//! exited or the attempt budget runs out. The returned [`ShutdownReport`]
//! says which threads, if any, were still alive.
//!
//! # Example
//!
//! ```rust,ignore
//! use action_runner::config::WorkerPoolConfig;
//! use action_runner::core::{ActionInvoker, WorkerPool};
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new()
//!         .with_instance_name("NightlyReports")
//!         .with_worker_thread_count(3),
//! )?;
//! pool.start()?;
//!
//! let handle = pool.dispatch(invoker)?;
//! let result = handle.wait(Duration::from_secs(60))?;
//!
//! let report = pool.shutdown();
//! assert!(report.is_clean());
//! ```

mod native;
mod registry;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::ActionResult;

pub use native::WorkerPool;
pub use registry::{ThreadInfo, ThreadRegistry};

/// Lifecycle state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolState {
    /// Constructed; no threads yet.
    Created,
    /// Threads running and accepting work.
    Started,
    /// No longer accepting work; waiting for threads to exit.
    ShuttingDown,
    /// Terminal.
    Stopped,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::ShuttingDown => "shutting down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug)]
pub enum PoolError {
    /// Work was dispatched while the pool was not started.
    NotStarted(PoolState),

    /// A lifecycle call was made in the wrong state.
    InvalidState {
        /// State the call requires.
        expected: PoolState,
        /// State the pool was in.
        actual: PoolState,
    },

    /// Configuration validation failed.
    InvalidConfig(String),

    /// The OS refused to create a pool thread.
    ThreadSpawn(String),

    /// A run result was not available in time.
    Timeout,

    /// The run was discarded before it reported a result.
    RunDropped,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted(state) => write!(f, "pool is not started (state: {state})"),
            Self::InvalidState { expected, actual } => {
                write!(f, "invalid pool state: expected {expected}, found {actual}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::ThreadSpawn(msg) => write!(f, "failed to spawn pool thread: {msg}"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::RunDropped => write!(f, "run was dropped before completion"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Runs accepted by `dispatch`.
    pub dispatched_runs: u64,
    /// Runs currently executing.
    pub active_runs: u64,
    /// Runs that completed (whatever the action reported).
    pub completed_runs: u64,
    /// Runs that failed to invoke or execute.
    pub failed_runs: u64,
    /// Runs discarded by shutdown.
    pub dropped_runs: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub dispatched_runs: AtomicU64,
    pub active_runs: AtomicU64,
    pub completed_runs: AtomicU64,
    pub failed_runs: AtomicU64,
    pub dropped_runs: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            dispatched_runs: self.dispatched_runs.load(Ordering::Relaxed),
            active_runs: self.active_runs.load(Ordering::Relaxed),
            completed_runs: self.completed_runs.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            dropped_runs: self.dropped_runs.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of [`WorkerPool::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// State before shutdown was requested.
    pub previous_state: PoolState,
    /// Number of registry polls performed.
    pub attempts: u32,
    /// Pool threads still alive when polling stopped.
    pub residual_threads: Vec<ThreadInfo>,
}

impl ShutdownReport {
    /// Whether every pool thread exited.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.residual_threads.is_empty()
    }
}

/// Handle to a dispatched run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: Uuid,
    result_rx: Receiver<ActionResult>,
}

impl RunHandle {
    pub(crate) const fn new(run_id: Uuid, result_rx: Receiver<ActionResult>) -> Self {
        Self { run_id, result_rx }
    }

    /// Identifier used in audit events.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Block until the run reports, or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// - `PoolError::Timeout` if no result arrived in time
    /// - `PoolError::RunDropped` if the run was discarded by shutdown
    pub fn wait(&self, timeout: Duration) -> Result<ActionResult, PoolError> {
        self.result_rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => PoolError::Timeout,
            RecvTimeoutError::Disconnected => PoolError::RunDropped,
        })
    }

    /// The result, if the run already reported.
    #[must_use]
    pub fn try_result(&self) -> Option<ActionResult> {
        self.result_rx.try_recv().ok()
    }

    /// Wait for the result from async code without blocking the runtime.
    ///
    /// # Errors
    ///
    /// Same as [`RunHandle::wait`].
    #[cfg(feature = "tokio-runtime")]
    pub async fn wait_async(self, timeout: Duration) -> Result<ActionResult, PoolError> {
        let rx = self.result_rx;
        let waited = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || rx.recv()),
        )
        .await;
        match waited {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(_) => Err(PoolError::RunDropped),
            Err(_) => Err(PoolError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::NotStarted(PoolState::Created);
        assert_eq!(format!("{}", err), "pool is not started (state: created)");

        let err = PoolError::InvalidState {
            expected: PoolState::Created,
            actual: PoolState::Stopped,
        };
        assert_eq!(format!("{}", err), "invalid pool state: expected created, found stopped");

        let err = PoolError::Timeout;
        assert_eq!(format!("{}", err), "operation timed out");
    }

    #[test]
    fn test_pool_counters_snapshot() {
        let counters = PoolCounters::default();
        counters.dispatched_runs.fetch_add(10, Ordering::Relaxed);
        counters.completed_runs.fetch_add(5, Ordering::Relaxed);
        counters.dropped_runs.fetch_add(1, Ordering::Relaxed);

        let stats = counters.snapshot(4);
        assert_eq!(stats.worker_count, 4);
        assert_eq!(stats.dispatched_runs, 10);
        assert_eq!(stats.completed_runs, 5);
        assert_eq!(stats.dropped_runs, 1);
    }

    #[test]
    fn test_run_handle_reports_drop() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let handle = RunHandle::new(Uuid::new_v4(), rx);
        assert!(handle.try_result().is_none());
        drop(tx);
        assert!(matches!(
            handle.wait(Duration::from_millis(10)),
            Err(PoolError::RunDropped)
        ));
    }
}
