//! Thread-backed implementation of `WorkerPool`.
//!
//! # Design
//!
//! - **Dispatch thread**: receives invokers from `dispatch` on an unbounded
//!   channel and hands each one to a worker over a zero-capacity channel, so
//!   a hand-off only succeeds when a worker is idle.
//! - **Workers**: block on the hand-off channel and run one invoker at a time.
//!   A panicking action is caught and reported as a failed run.
//! - **Shutdown**: dropping the dispatch sender ends the dispatch loop, which
//!   drops the hand-off sender and lets idle workers exit. Busy workers exit
//!   after their current run. The pool then polls the thread registry.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::WorkerPoolConfig;
use crate::core::audit::{build_audit_event, AuditSink, RunPhase, TracingAuditSink};
use crate::core::{ActionInvoker, ActionResult, InvokerError};

use super::{
    PoolCounters, PoolError, PoolState, PoolStats, RunHandle, ShutdownReport, ThreadInfo,
    ThreadRegistry,
};

/// How long the dispatch thread waits for an idle worker before re-checking
/// the shutdown flag.
const HANDOFF_POLL: Duration = Duration::from_millis(50);

/// An invoker on its way to a worker.
struct Dispatched {
    run_id: Uuid,
    action: String,
    user: String,
    invoker: ActionInvoker,
    result_tx: Sender<ActionResult>,
}

/// State shared by the pool and its threads.
struct Shared {
    pool_name: String,
    counters: PoolCounters,
    audit: Arc<dyn AuditSink>,
    shutdown: AtomicBool,
}

impl Shared {
    fn record(&self, run_id: Uuid, user: &str, action: &str, phase: RunPhase, payload: Option<String>) {
        self.audit.record(build_audit_event(
            run_id,
            self.pool_name.as_str(),
            user,
            action,
            phase,
            payload,
        ));
    }

    fn drop_run(&self, job: Dispatched) {
        self.counters.dropped_runs.fetch_add(1, Ordering::Relaxed);
        self.record(job.run_id, &job.user, &job.action, RunPhase::Dropped, None);
        debug!(run_id = %job.run_id, "Run dropped by shutdown");
    }
}

/// Worker pool with a dispatch thread and dedicated worker threads.
///
/// Every thread name starts with the configured instance name, and every thread
/// is registered in the pool's [`ThreadRegistry`] while it runs.
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Lifecycle state.
    state: Mutex<PoolState>,

    /// Sender to the dispatch thread. `None` outside `Started`.
    dispatch_tx: Mutex<Option<Sender<Dispatched>>>,

    /// State shared with the pool threads.
    shared: Arc<Shared>,

    /// Live-thread registry.
    registry: ThreadRegistry,

    /// Handles of spawned threads, with their daemon flag.
    handles: Mutex<Vec<(JoinHandle<()>, bool)>>,
}

impl WorkerPool {
    /// Create a pool in the `Created` state with a private thread registry and
    /// the tracing audit sink.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        Self::with_parts(config, ThreadRegistry::new(), Arc::new(TracingAuditSink))
    }

    /// Create a pool that registers its threads in `registry` and reports
    /// runs to `audit`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn with_parts(
        config: WorkerPoolConfig,
        registry: ThreadRegistry,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        Ok(Self {
            shared: Arc::new(Shared {
                pool_name: config.instance_name.clone(),
                counters: PoolCounters::default(),
                audit,
                shutdown: AtomicBool::new(false),
            }),
            config,
            state: Mutex::new(PoolState::Created),
            dispatch_tx: Mutex::new(None),
            registry,
            handles: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the worker threads and the dispatch thread.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidState` unless the pool is `Created`
    /// - `PoolError::ThreadSpawn` if a thread cannot be created; threads
    ///   already spawned are told to exit and the pool moves to `Stopped`
    pub fn start(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        if *state != PoolState::Created {
            return Err(PoolError::InvalidState {
                expected: PoolState::Created,
                actual: *state,
            });
        }

        let (dispatch_tx, dispatch_rx) = unbounded::<Dispatched>();
        let (work_tx, work_rx) = bounded::<Dispatched>(0);
        let name = &self.config.instance_name;
        let mut handles = self.handles.lock();

        for worker_id in 1..=self.config.worker_thread_count {
            let spawned = spawn_worker(
                &self.registry,
                format!("{name}_Worker-{worker_id}"),
                self.config.make_threads_daemons,
                self.config.thread_stack_size,
                work_rx.clone(),
                Arc::clone(&self.shared),
            );
            match spawned {
                Ok(handle) => handles.push((handle, self.config.make_threads_daemons)),
                Err(e) => {
                    error!(worker_id, error = %e, "Failed to spawn worker thread");
                    self.shared.shutdown.store(true, Ordering::Release);
                    *state = PoolState::Stopped;
                    return Err(PoolError::ThreadSpawn(e.to_string()));
                }
            }
        }
        drop(work_rx);

        let spawned = spawn_dispatcher(
            &self.registry,
            format!("{name}_DispatchThread"),
            self.config.make_dispatch_thread_daemon,
            dispatch_rx,
            work_tx,
            Arc::clone(&self.shared),
        );
        match spawned {
            Ok(handle) => handles.push((handle, self.config.make_dispatch_thread_daemon)),
            Err(e) => {
                error!(error = %e, "Failed to spawn dispatch thread");
                self.shared.shutdown.store(true, Ordering::Release);
                *state = PoolState::Stopped;
                return Err(PoolError::ThreadSpawn(e.to_string()));
            }
        }

        *self.dispatch_tx.lock() = Some(dispatch_tx);
        *state = PoolState::Started;
        info!(
            instance_name = %self.config.instance_name,
            instance_id = %self.config.instance_id,
            worker_thread_count = self.config.worker_thread_count,
            "WorkerPool started"
        );
        Ok(())
    }

    /// Hand an invoker to the pool. It runs on the next idle worker.
    ///
    /// # Errors
    ///
    /// `PoolError::NotStarted` unless the pool is `Started`.
    pub fn dispatch(&self, invoker: ActionInvoker) -> Result<RunHandle, PoolError> {
        let state = self.state.lock();
        let tx_guard = self.dispatch_tx.lock();
        let Some(tx) = tx_guard.as_ref().filter(|_| *state == PoolState::Started) else {
            return Err(PoolError::NotStarted(*state));
        };

        let run_id = Uuid::new_v4();
        let (result_tx, result_rx) = bounded(1);
        let job = Dispatched {
            run_id,
            action: invoker.action_name().to_owned(),
            user: invoker.acting_user().to_owned(),
            invoker,
            result_tx,
        };
        let (user, action) = (job.user.clone(), job.action.clone());

        tx.send(job).map_err(|_| PoolError::NotStarted(PoolState::ShuttingDown))?;
        self.shared.counters.dispatched_runs.fetch_add(1, Ordering::Relaxed);
        self.shared.record(run_id, &user, &action, RunPhase::Dispatched, None);
        debug!(run_id = %run_id, action = %action, "Run dispatched");
        Ok(RunHandle::new(run_id, result_rx))
    }

    /// Stop accepting work and wait, within the configured polling budget,
    /// for every pool thread to exit. Running actions are not interrupted.
    ///
    /// Always ends in `Stopped`. Calling it again is a no-op. Threads still
    /// alive after the budget are listed in the report and logged.
    pub fn shutdown(&self) -> ShutdownReport {
        let previous_state = {
            let mut state = self.state.lock();
            let previous = *state;
            match previous {
                PoolState::Stopped | PoolState::ShuttingDown => {
                    return ShutdownReport {
                        previous_state: previous,
                        attempts: 0,
                        residual_threads: self.live_threads(),
                    };
                }
                PoolState::Created | PoolState::Started => *state = PoolState::ShuttingDown,
            }
            previous
        };

        info!(instance_name = %self.config.instance_name, "Shutting down worker pool");
        self.shared.shutdown.store(true, Ordering::Release);
        self.dispatch_tx.lock().take();

        let interval = self.config.shutdown_poll_interval();
        let mut attempts = 0;
        let mut residual = self.live_threads();
        while !residual.is_empty() && attempts < self.config.shutdown_poll_attempts {
            attempts += 1;
            thread::sleep(interval);
            residual = self.live_threads();
        }

        if residual.is_empty() {
            for (handle, _) in self.handles.lock().drain(..) {
                if handle.join().is_err() {
                    warn!("Pool thread panicked");
                }
            }
            info!(attempts, "Worker pool shut down complete");
        } else {
            let names: Vec<&str> = residual.iter().map(|t| t.name.as_str()).collect();
            warn!(
                attempts,
                residual = ?names,
                "Pool threads still alive after shutdown polling"
            );
            self.handles.lock().retain(|(_, daemon)| !daemon);
        }

        *self.state.lock() = PoolState::Stopped;
        ShutdownReport {
            previous_state,
            attempts,
            residual_threads: residual,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PoolState {
        *self.state.lock()
    }

    /// Live threads belonging to this pool (named `"{instance_name}_..."`).
    #[must_use]
    pub fn live_threads(&self) -> Vec<ThreadInfo> {
        self.registry.live_threads_of(&self.config.instance_name)
    }

    /// Registry the pool's threads are recorded in.
    #[must_use]
    pub const fn thread_registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot(self.config.worker_thread_count)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal shutdown without polling; only non-daemon threads are joined.
        self.shared.shutdown.store(true, Ordering::Release);
        self.dispatch_tx.lock().take();
        for (handle, daemon) in self.handles.lock().drain(..) {
            if !daemon && handle.join().is_err() {
                warn!("Pool thread panicked");
            }
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    registry: &ThreadRegistry,
    name: String,
    daemon: bool,
    stack_size: Option<usize>,
    work_rx: Receiver<Dispatched>,
    shared: Arc<Shared>,
) -> std::io::Result<JoinHandle<()>> {
    registry.spawn(name, daemon, stack_size, move || {
        debug!("Worker thread started");

        // Blocks until a run arrives; Err once the dispatch thread is gone.
        while let Ok(job) = work_rx.recv() {
            let Dispatched {
                run_id,
                action,
                user,
                invoker,
                result_tx,
            } = job;

            shared.counters.active_runs.fetch_add(1, Ordering::Relaxed);
            shared.record(run_id, &user, &action, RunPhase::Started, None);

            let outcome = panic::catch_unwind(AssertUnwindSafe(move || invoker.run()));
            let result = match outcome {
                Ok(Ok(result)) => {
                    shared.counters.completed_runs.fetch_add(1, Ordering::Relaxed);
                    shared.record(
                        run_id,
                        &user,
                        &action,
                        RunPhase::Completed,
                        Some(format!("success={}", result.success)),
                    );
                    result
                }
                Ok(Err(e)) => fail_run(&shared, run_id, &user, &action, &e),
                Err(panic) => {
                    let msg = panic_message(panic.as_ref());
                    error!(run_id = %run_id, panic = %msg, "Action panicked");
                    let err = format!("action panicked: {msg}");
                    shared.counters.failed_runs.fetch_add(1, Ordering::Relaxed);
                    shared.record(run_id, &user, &action, RunPhase::Failed, Some(err.clone()));
                    ActionResult::failed(err)
                }
            };

            shared.counters.active_runs.fetch_sub(1, Ordering::Relaxed);
            // The caller may have dropped the handle.
            let _ = result_tx.send(result);
        }

        debug!("Worker thread exiting");
    })
}

fn fail_run(shared: &Shared, run_id: Uuid, user: &str, action: &str, err: &InvokerError) -> ActionResult {
    warn!(run_id = %run_id, error = %err, "Run failed");
    shared.counters.failed_runs.fetch_add(1, Ordering::Relaxed);
    shared.record(run_id, user, action, RunPhase::Failed, Some(err.to_string()));
    ActionResult::failed(err)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

/// Spawn the dispatch thread.
fn spawn_dispatcher(
    registry: &ThreadRegistry,
    name: String,
    daemon: bool,
    dispatch_rx: Receiver<Dispatched>,
    work_tx: Sender<Dispatched>,
    shared: Arc<Shared>,
) -> std::io::Result<JoinHandle<()>> {
    registry.spawn(name, daemon, None, move || {
        debug!("Dispatch thread started");

        // Ends once the pool drops its sender and the queue is drained.
        'runs: for mut job in dispatch_rx.iter() {
            if shared.shutdown.load(Ordering::Acquire) {
                shared.drop_run(job);
                continue;
            }
            loop {
                match work_tx.send_timeout(job, HANDOFF_POLL) {
                    Ok(()) => break,
                    Err(SendTimeoutError::Timeout(pending)) => {
                        if shared.shutdown.load(Ordering::Acquire) {
                            shared.drop_run(pending);
                            continue 'runs;
                        }
                        job = pending;
                    }
                    Err(SendTimeoutError::Disconnected(pending)) => {
                        error!("All workers exited; dropping run");
                        shared.drop_run(pending);
                        continue 'runs;
                    }
                }
            }
        }

        // Dropping the hand-off sender releases idle workers.
        drop(work_tx);
        debug!("Dispatch thread exiting");
    })
}
