//! Tests for audit sink

use action_runner::core::{build_audit_event, AuditSink, InMemoryAuditSink, RunPhase};
use uuid::Uuid;

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);
    let run_id = Uuid::new_v4();

    sink.record(build_audit_event(
        run_id,
        "pool1",
        "joe",
        "sales_report",
        RunPhase::Dispatched,
        None,
    ));
    sink.record(build_audit_event(
        run_id,
        "pool1",
        "joe",
        "sales_report",
        RunPhase::Completed,
        Some("success=true".to_string()),
    ));
    sink.record(build_audit_event(Uuid::new_v4(), "pool1", "sue", "etl", RunPhase::Started, None));

    assert_eq!(sink.events().len(), 3);
    let events = sink.events_for(run_id);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].phase, RunPhase::Dispatched);
    assert_eq!(events[1].phase, RunPhase::Completed);
    assert_eq!(events[1].payload.as_deref(), Some("success=true"));
    assert_eq!(events[0].user, "joe");
    assert_ne!(events[0].event_id, events[1].event_id);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    for id in &ids {
        sink.record(build_audit_event(*id, "pool1", "joe", "a", RunPhase::Dispatched, None));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].run_id, ids[1]); // First one popped
    assert_eq!(events[1].run_id, ids[2]);
}

#[test]
fn test_run_phase_serializes_snake_case() {
    let json = serde_json::to_string(&RunPhase::Dropped).unwrap();
    assert_eq!(json, "\"dropped\"");
}
