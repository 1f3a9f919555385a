//! Draft staging and confirmation.

mod support;

use prometheus_rollcall::config::PersistenceMode;
use prometheus_rollcall::core::{AuditAction, RollcallError};
use prometheus_rollcall::util::PreviewId;
use support::{draft, harness, minutes, origin, t0};

#[tokio::test]
async fn test_preview_ttl() {
    let h = harness(PersistenceMode::WriteThrough);
    let id = h.coordinator.stage_preview(draft(&h, "fractal", t0() + minutes(60)));

    h.clock.advance(minutes(14));
    let preview = h.coordinator.get_preview(&id).unwrap();
    assert_eq!(preview.created_at, t0());
    assert_eq!(preview.origin().author_id, origin().author_id);

    h.clock.advance(minutes(2));
    // reads do not filter by age; the next store sweeps
    assert!(h.coordinator.has_preview(&id));
    h.coordinator
        .store_preview(PreviewId::from("next"), draft(&h, "party", t0() + minutes(60)));
    assert!(!h.coordinator.has_preview(&id));
    assert!(h.coordinator.has_preview(&PreviewId::from("next")));
}

#[tokio::test]
async fn test_confirm_creates_the_event_once() {
    let h = harness(PersistenceMode::WriteThrough);
    let id = h.coordinator.stage_preview(draft(&h, "fractal", t0() + minutes(60)));

    let event = h.coordinator.confirm_preview(&id).await.unwrap();
    assert_eq!(event.capacity, 5);
    assert!(event.offers_role("Glut"));
    assert_eq!(event.creator_id, origin().author_id);
    assert!(h.coordinator.event(event.id).is_some());
    assert!(!h.coordinator.has_preview(&id));

    let err = h.coordinator.confirm_preview(&id).await.unwrap_err();
    assert!(matches!(err, RollcallError::PreviewNotFound(_)));

    let created = h
        .audit
        .lock()
        .events()
        .iter()
        .filter(|e| e.action == AuditAction::Created)
        .count();
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_expired_preview_cannot_be_confirmed() {
    let h = harness(PersistenceMode::WriteThrough);
    let id = h.coordinator.stage_preview(draft(&h, "raid", t0() + minutes(60)));
    h.clock.advance(minutes(16));

    let err = h.coordinator.confirm_preview(&id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(h.coordinator.events().is_empty());
}

#[tokio::test]
async fn test_discard_and_unknown_template() {
    let h = harness(PersistenceMode::WriteThrough);
    let id = h.coordinator.stage_preview(draft(&h, "squad", t0()));
    assert!(h.coordinator.delete_preview(&id));
    assert!(h.coordinator.get_preview(&id).is_none());

    let err = h
        .coordinator
        .draft("dungeon", "x", t0(), None, &[], origin())
        .unwrap_err();
    assert!(matches!(err, RollcallError::UnknownTemplate(_)));
}
