//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use prometheus_rollcall::builders::CoordinatorBuilder;
use prometheus_rollcall::config::{PersistenceMode, RollcallConfig, SnapshotBackendConfig};
use prometheus_rollcall::core::{
    Coordinator, Event, EventDraft, InMemoryAuditSink, Origin, PublishedRefs, Spawn,
};
use prometheus_rollcall::infra::{InMemorySnapshot, RecordingCollaborator};
use prometheus_rollcall::util::{EventId, ManualClock, MessageRef, ThreadRef, UserId};

// Simple tokio spawner for tests
#[derive(Clone)]
pub struct TestSpawner;

impl Spawn for TestSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(fut);
    }
}

/// Fixed wall-clock origin for tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 27, 18, 0, 0).unwrap()
}

pub struct Harness {
    pub coordinator: Coordinator<TestSpawner>,
    pub collaborator: Arc<RecordingCollaborator>,
    pub backend: Arc<InMemorySnapshot>,
    pub clock: Arc<ManualClock>,
    pub audit: Arc<Mutex<InMemoryAuditSink>>,
}

pub fn harness(mode: PersistenceMode) -> Harness {
    harness_with(Arc::new(InMemorySnapshot::new()), mode)
}

pub fn harness_with(backend: Arc<InMemorySnapshot>, mode: PersistenceMode) -> Harness {
    prometheus_rollcall::util::init_tracing();
    let mut config = RollcallConfig::default();
    config.persistence.backend = SnapshotBackendConfig::InMemory;
    config.persistence.mode = mode;

    let collaborator = Arc::new(RecordingCollaborator::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let audit = Arc::new(Mutex::new(InMemoryAuditSink::new(1_000)));
    let coordinator = CoordinatorBuilder::new(config)
        .with_collaborator(collaborator.clone())
        .with_clock(clock.clone())
        .with_backend(backend.clone())
        .with_audit(audit.clone())
        .build(TestSpawner)
        .unwrap();

    Harness {
        coordinator,
        collaborator,
        backend,
        clock,
        audit,
    }
}

pub fn origin() -> Origin {
    Origin {
        channel_id: "chan".into(),
        guild_id: "guild".into(),
        author_id: UserId::from("op"),
        author_name: Some("Operator".into()),
    }
}

pub fn draft(h: &Harness, template: &str, start: DateTime<Utc>) -> EventDraft {
    h.coordinator
        .draft(template, "Test run", start, None, &[], origin())
        .unwrap()
}

pub fn refs(tag: &str) -> PublishedRefs {
    PublishedRefs {
        message: MessageRef::new(format!("msg-{tag}")),
        thread: Some(ThreadRef::new(format!("thread-{tag}"))),
    }
}

/// Create and publish an event with the given capacity.
pub async fn published(h: &Harness, capacity: u32, start: DateTime<Utc>) -> Event {
    let mut draft = draft(h, "party", start);
    draft.capacity = capacity;
    let event = h.coordinator.create_event(draft).await.unwrap();
    h.coordinator
        .publish(event.id, refs(&event.id.to_string()))
        .await
        .unwrap()
}

/// An event as an earlier process would have persisted it.
pub fn persisted(start: DateTime<Utc>, tag: &str) -> Event {
    let template = &prometheus_rollcall::config::default_templates()["party"];
    let mut event = EventDraft::from_template("party", template, tag, start, None, &[], origin())
        .unwrap()
        .into_event(EventId::new());
    event.message_id = Some(MessageRef::new(format!("msg-{tag}")));
    event.thread_id = Some(ThreadRef::new(format!("thread-{tag}")));
    event
}

pub fn user(name: &str) -> UserId {
    UserId::from(name)
}

pub fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

pub fn std_minutes(n: u64) -> std::time::Duration {
    std::time::Duration::from_secs(n * 60)
}
