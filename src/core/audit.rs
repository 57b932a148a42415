//! Audit sinks for scheduled runs.
//!
//! The pool reports each run's progress here; this is how the trigger engine
//! learns which scheduled runs completed, failed or were dropped.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clock::now_ms;

/// Stage of a run an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Handed to the pool.
    Dispatched,
    /// Picked up by a worker.
    Started,
    /// Finished; see `success`.
    Completed,
    /// Invocation or execution failed.
    Failed,
    /// Discarded because the pool shut down first.
    Dropped,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Run the event belongs to.
    pub run_id: Uuid,
    /// Scheduler instance name.
    pub pool: String,
    /// Acting user of the run.
    pub user: String,
    /// Action name.
    pub action: String,
    /// Stage reached.
    pub phase: RunPhase,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context (error text, success flag).
    pub payload: Option<String>,
}

/// Audit sink abstraction. Shared by all workers of a pool.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events recorded for one run, oldest first.
    #[must_use]
    pub fn events_for(&self, run_id: Uuid) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.run_id == run_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink that writes events to the `tracing` log. The pool default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "action_runner::audit",
            run_id = %event.run_id,
            pool = %event.pool,
            user = %event.user,
            action = %event.action,
            phase = ?event.phase,
            payload = event.payload.as_deref().unwrap_or(""),
            "run event"
        );
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    run_id: Uuid,
    pool: impl Into<String>,
    user: impl Into<String>,
    action: impl Into<String>,
    phase: RunPhase,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4(),
        run_id,
        pool: pool.into(),
        user: user.into(),
        action: action.into(),
        phase,
        created_at_ms: now_ms(),
        payload,
    }
}
