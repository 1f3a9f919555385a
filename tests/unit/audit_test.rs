//! Tests for audit sink

use chrono::Utc;
use prometheus_rollcall::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};
use prometheus_rollcall::util::{EventId, UserId};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let id = EventId::new();

    let event = build_audit_event(
        id,
        AuditAction::Joined,
        Some(UserId::from("u1")),
        Some("DPS".to_string()),
        Utc::now(),
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, id);
    assert_eq!(events[0].user, Some(UserId::from("u1")));
    assert_eq!(events[0].action, AuditAction::Joined);
}

#[test]
fn test_audit_sink_zero_capacity() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(EventId::new(), AuditAction::Created, None, None, Utc::now()));
    assert!(sink.events().is_empty());
}

#[test]
fn test_audit_event_serialization() {
    let event = build_audit_event(
        EventId::new(),
        AuditAction::Promoted,
        Some(UserId::from("u2")),
        None,
        Utc::now(),
    );
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "promoted");
    assert_eq!(json["user"], "u2");
}
