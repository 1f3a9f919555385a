//! Tests for error types

use prometheus_rollcall::core::RollcallError;
use prometheus_rollcall::util::{EventId, PreviewId};

#[test]
fn test_event_not_found_error() {
    let id = EventId::new();
    let err = RollcallError::EventNotFound(id);
    assert_eq!(format!("{}", err), format!("event not found: {id}"));
    assert!(err.is_not_found());
}

#[test]
fn test_preview_not_found_error() {
    let err = RollcallError::PreviewNotFound(PreviewId::from("abc_1"));
    assert_eq!(format!("{}", err), "preview not found: abc_1");
    assert!(err.is_not_found());
}

#[test]
fn test_unknown_role_error() {
    let id = EventId::new();
    let err = RollcallError::UnknownRole {
        event: id,
        role: "Bard".to_string(),
    };
    assert_eq!(format!("{}", err), format!("role `Bard` is not offered by event {id}"));
    assert!(!err.is_not_found());
}

#[test]
fn test_persistence_error() {
    let err = RollcallError::Persistence("disk full".to_string());
    assert_eq!(format!("{}", err), "persistence failure: disk full");
}

#[test]
fn test_collaborator_error() {
    let err = RollcallError::Collaborator("thread archived".to_string());
    assert_eq!(format!("{}", err), "collaborator failure: thread archived");
}
