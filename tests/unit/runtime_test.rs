//! Tests for tokio spawner utilities and the API surface

use std::sync::Arc;

use chrono::{Duration, Utc};
use prometheus_rollcall::builders::CoordinatorBuilder;
use prometheus_rollcall::config::{PersistenceMode, RollcallConfig, SnapshotBackendConfig};
use prometheus_rollcall::core::{Origin, Placement, RoleAction, Spawn};
use prometheus_rollcall::infra::RecordingCollaborator;
use prometheus_rollcall::runtime::tokio_spawner::TokioSpawner;
use prometheus_rollcall::runtime::{health, restore, toggle, ToggleRequest};
use prometheus_rollcall::util::UserId;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_owned_multi_thread_runtime() {
    let (runtime, spawner) = TokioSpawner::multi_thread(Some(2)).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    spawner.spawn(async move {
        tx.send(7).unwrap();
    });
    assert_eq!(rx.recv().unwrap(), 7);
    drop(runtime);
}

#[tokio::test]
async fn test_api_toggle_and_health() {
    let mut config = RollcallConfig::default();
    config.persistence.backend = SnapshotBackendConfig::InMemory;
    config.persistence.mode = PersistenceMode::WriteThrough;
    let coordinator = CoordinatorBuilder::new(config)
        .with_collaborator(Arc::new(RecordingCollaborator::new()))
        .build(TokioSpawner::current())
        .unwrap();

    let mut draft = coordinator
        .draft("party", "Run", Utc::now() + Duration::hours(2), None, &[], Origin::default())
        .unwrap();
    draft.capacity = 1;
    let event = coordinator.create_event(draft).await.unwrap();

    let first = toggle(
        &coordinator,
        ToggleRequest {
            event_id: event.id,
            user_id: UserId::from("a"),
            role: "DPS".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(first.placement, Placement::Accepted);
    assert_eq!(first.action, RoleAction::Added);

    toggle(
        &coordinator,
        ToggleRequest {
            event_id: event.id,
            user_id: UserId::from("b"),
            role: "DPS".into(),
        },
    )
    .await
    .unwrap();

    let leave = toggle(
        &coordinator,
        ToggleRequest {
            event_id: event.id,
            user_id: UserId::from("a"),
            role: "DPS".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(leave.placement, Placement::Absent);
    assert_eq!(leave.promoted, Some(UserId::from("b")));
    assert_eq!((leave.accepted, leave.waitlisted, leave.capacity), (1, 0, 1));

    let bad = toggle(
        &coordinator,
        ToggleRequest {
            event_id: event.id,
            user_id: UserId::from("a"),
            role: "Nope".into(),
        },
    )
    .await;
    assert!(bad.is_err());

    let summary = restore(&coordinator).await;
    assert_eq!((summary.restored, summary.reminders_armed, summary.retired), (1, 1, 0));

    let status = health(&coordinator);
    assert!(status.ok);
    assert_eq!(status.events, 1);
    assert_eq!(status.persistence, PersistenceMode::WriteThrough);
}
