//! Tests for utility functions

use chrono::{Duration, TimeZone, Utc};
use prometheus_rollcall::util::{
    init_tracing, Clock, EventId, ManualClock, PreviewId, SystemClock, UserId, DEFAULT_LOG_FILTER,
};

#[test]
fn test_event_id_round_trip() {
    let id = EventId::new();
    let parsed: EventId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert_ne!(EventId::new(), id);
}

#[test]
fn test_event_id_rejects_garbage() {
    assert!("not-a-uuid".parse::<EventId>().is_err());
}

#[test]
fn test_preview_id_carries_author() {
    let id = PreviewId::generate(&UserId::from("1234"));
    assert!(id.as_str().ends_with("_1234"));
    assert_ne!(PreviewId::generate(&UserId::from("1234")), id);
}

#[test]
fn test_manual_clock() {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);
    clock.advance(Duration::minutes(90));
    assert_eq!(clock.now(), start + Duration::minutes(90));
    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn test_system_clock_moves_forward() {
    let a = SystemClock.now();
    let b = SystemClock.now();
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    assert!(tracing::dispatcher::has_been_set());
    assert!(DEFAULT_LOG_FILTER.starts_with("prometheus_rollcall"));
}
