//! Coordinator configuration structures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::templates::{default_templates, TemplateConfig};
use crate::core::AppResult;

/// Lifecycle offsets relative to an event's start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minutes before start at which the reminder fires.
    pub reminder_lead_minutes: u32,
    /// Minutes after start at which the event is torn down.
    pub cleanup_grace_minutes: u32,
    /// Minutes an unconfirmed preview stays valid.
    pub preview_ttl_minutes: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reminder_lead_minutes: 15,
            cleanup_grace_minutes: 150,
            preview_ttl_minutes: 15,
        }
    }
}

impl TimingConfig {
    /// Reminder lead as a chrono duration.
    #[must_use]
    pub fn reminder_lead(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.reminder_lead_minutes))
    }

    /// Cleanup grace as a chrono duration.
    #[must_use]
    pub fn cleanup_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cleanup_grace_minutes))
    }

    /// Preview TTL as a chrono duration.
    #[must_use]
    pub fn preview_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.preview_ttl_minutes))
    }

    /// Validate timing values.
    pub fn validate(&self) -> Result<(), String> {
        if self.cleanup_grace_minutes == 0 {
            return Err("cleanup_grace_minutes must be greater than 0".into());
        }
        if self.preview_ttl_minutes == 0 {
            return Err("preview_ttl_minutes must be greater than 0".into());
        }
        Ok(())
    }
}

/// Snapshot backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SnapshotBackendConfig {
    /// Volatile in-memory snapshot for development/testing.
    InMemory,
    /// Pretty-printed JSON array on disk.
    JsonFile {
        /// Snapshot file location.
        path: PathBuf,
    },
}

/// When snapshot writes happen relative to the mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// Mutations await their snapshot write before returning.
    WriteThrough,
    /// Mutations hand the snapshot to a background persister.
    #[default]
    WriteBehind,
}

/// Bounded retry for snapshot writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per snapshot, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Upper bound on the delay between retries.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (1-based), doubling and capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend selection.
    pub backend: SnapshotBackendConfig,
    /// Write timing.
    #[serde(default)]
    pub mode: PersistenceMode,
    /// Retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: SnapshotBackendConfig::JsonFile {
                path: PathBuf::from("data").join(EVENTS_FILE),
            },
            mode: PersistenceMode::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl PersistenceConfig {
    /// Validate persistence values.
    pub fn validate(&self) -> Result<(), String> {
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be greater than 0".into());
        }
        if let SnapshotBackendConfig::JsonFile { path } = &self.backend {
            if path.as_os_str().is_empty() {
                return Err("snapshot path must not be empty".into());
            }
        }
        Ok(())
    }
}

/// Snapshot file name inside a data directory.
pub const EVENTS_FILE: &str = "events.json";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollcallConfig {
    /// Lifecycle offsets.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Snapshot persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Template catalog keyed by template key.
    #[serde(default = "default_templates")]
    pub templates: HashMap<String, TemplateConfig>,
}

impl Default for RollcallConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            persistence: PersistenceConfig::default(),
            templates: default_templates(),
        }
    }
}

impl RollcallConfig {
    /// Validate all sections and ensure at least one template exists.
    pub fn validate(&self) -> Result<(), String> {
        self.timing.validate().map_err(|e| format!("timing invalid: {e}"))?;
        self.persistence
            .validate()
            .map_err(|e| format!("persistence invalid: {e}"))?;
        if self.templates.is_empty() {
            return Err("at least one template must be defined".into());
        }
        for (key, template) in &self.templates {
            template
                .validate()
                .map_err(|e| format!("template `{key}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading config {}", path.display()))
    }

    /// Build configuration from the environment, reading `.env` if present.
    ///
    /// `ROLLCALL_CONFIG` names a JSON file to start from; `ROLLCALL_DATA_DIR`
    /// points the JSON snapshot at `<dir>/events.json`;
    /// `ROLLCALL_PERSISTENCE_MODE` is `write_through` or `write_behind`.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = match std::env::var("ROLLCALL_CONFIG") {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(dir) = std::env::var("ROLLCALL_DATA_DIR") {
            cfg.persistence.backend = SnapshotBackendConfig::JsonFile {
                path: PathBuf::from(dir).join(EVENTS_FILE),
            };
        }
        if let Ok(mode) = std::env::var("ROLLCALL_PERSISTENCE_MODE") {
            cfg.persistence.mode = serde_json::from_value(serde_json::Value::String(mode))
                .context("ROLLCALL_PERSISTENCE_MODE must be write_through or write_behind")?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
