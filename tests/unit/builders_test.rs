//! Tests for builder modules

use std::sync::Arc;

use prometheus_rollcall::builders::{backend_from_config, CoordinatorBuilder};
use prometheus_rollcall::config::{PersistenceMode, RollcallConfig, SnapshotBackendConfig};
use prometheus_rollcall::core::{RollcallError, SnapshotBackend, Spawn};
use prometheus_rollcall::infra::RecordingCollaborator;

#[derive(Clone)]
struct TestSpawner;

impl Spawn for TestSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(fut);
    }
}

fn in_memory() -> RollcallConfig {
    let mut config = RollcallConfig::default();
    config.persistence.backend = SnapshotBackendConfig::InMemory;
    config
}

#[test]
fn test_builder_requires_collaborator() {
    let err = CoordinatorBuilder::new(in_memory())
        .build(TestSpawner)
        .err()
        .unwrap();
    assert!(matches!(err, RollcallError::Config(_)));
}

#[test]
fn test_builder_rejects_invalid_config() {
    let mut config = in_memory();
    config.timing.preview_ttl_minutes = 0;
    let err = CoordinatorBuilder::new(config)
        .with_collaborator(Arc::new(RecordingCollaborator::new()))
        .build(TestSpawner)
        .err()
        .unwrap();
    assert!(err.to_string().contains("preview_ttl_minutes"));
}

#[tokio::test]
async fn test_builder_selects_mode() {
    let mut config = in_memory();
    config.persistence.mode = PersistenceMode::WriteThrough;
    let coordinator = CoordinatorBuilder::new(config)
        .with_collaborator(Arc::new(RecordingCollaborator::new()))
        .build(TestSpawner)
        .unwrap();
    assert_eq!(coordinator.store().persistence_mode(), PersistenceMode::WriteThrough);
    assert_eq!(coordinator.templates().len(), 5);
}

#[test]
fn test_backend_from_config() {
    let backend = backend_from_config(&SnapshotBackendConfig::InMemory);
    assert!(backend.load().unwrap().is_empty());

    let dir = tempfile::tempdir().unwrap();
    let backend = backend_from_config(&SnapshotBackendConfig::JsonFile {
        path: dir.path().join("missing.json"),
    });
    assert!(backend.load().unwrap().is_empty());
}
