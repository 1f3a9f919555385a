//! Builds a [`Coordinator`] from [`RollcallConfig`].

use std::sync::Arc;

use crate::config::{RollcallConfig, SnapshotBackendConfig};
use crate::core::{
    Coordinator, EventStore, Persister, RollcallError, SharedAuditSink, SharedBackend,
    SharedCollaborator, Spawn,
};
use crate::infra::snapshot::{InMemorySnapshot, JsonFileSnapshot};
use crate::util::clock::{SharedClock, SystemClock};

/// Instantiate the snapshot backend a config selects.
#[must_use]
pub fn backend_from_config(cfg: &SnapshotBackendConfig) -> SharedBackend {
    match cfg {
        SnapshotBackendConfig::InMemory => Arc::new(InMemorySnapshot::new()),
        SnapshotBackendConfig::JsonFile { path } => Arc::new(JsonFileSnapshot::new(path)),
    }
}

/// Assembles the store, persister and coordinator.
///
/// The collaborator is required; clock, backend and audit sink default to the
/// system clock, the configured backend and no audit.
pub struct CoordinatorBuilder {
    config: RollcallConfig,
    collaborator: Option<SharedCollaborator>,
    clock: Option<SharedClock>,
    backend: Option<SharedBackend>,
    audit: Option<SharedAuditSink>,
}

impl CoordinatorBuilder {
    /// Start from a configuration.
    #[must_use]
    pub const fn new(config: RollcallConfig) -> Self {
        Self {
            config,
            collaborator: None,
            clock: None,
            backend: None,
            audit: None,
        }
    }

    /// Platform seam.
    #[must_use]
    pub fn with_collaborator(mut self, collaborator: SharedCollaborator) -> Self {
        self.collaborator = Some(collaborator);
        self
    }

    /// Clock override.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Backend override; takes precedence over the configured one.
    #[must_use]
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Audit sink.
    #[must_use]
    pub fn with_audit(mut self, sink: SharedAuditSink) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Validate config, load the snapshot and wire everything onto `spawner`.
    pub fn build<S: Spawn>(self, spawner: S) -> Result<Coordinator<S>, RollcallError> {
        self.config
            .validate()
            .map_err(|e| RollcallError::Config(format!("config invalid: {e}")))?;
        let collaborator = self
            .collaborator
            .ok_or_else(|| RollcallError::Config("collaborator is required".into()))?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as SharedClock);
        let persistence = &self.config.persistence;
        let backend = self
            .backend
            .unwrap_or_else(|| backend_from_config(&persistence.backend));

        let persister = Persister::new(
            persistence.mode,
            Arc::clone(&backend),
            persistence.retry.clone(),
            &spawner,
        );
        let store = Arc::new(EventStore::open(&backend, persister)?);
        tracing::info!(
            mode = ?persistence.mode,
            templates = self.config.templates.len(),
            "coordinator built"
        );

        let coordinator = Coordinator::new(
            store,
            collaborator,
            clock,
            self.config.timing,
            self.config.templates,
            spawner,
        );
        Ok(match self.audit {
            Some(sink) => coordinator.with_audit(sink),
            None => coordinator,
        })
    }
}
