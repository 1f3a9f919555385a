//! Configuration models for timing, persistence, and event templates.

pub mod service;
pub mod templates;

pub use service::{
    PersistenceConfig, PersistenceMode, RetryConfig, RollcallConfig, SnapshotBackendConfig,
    TimingConfig,
};
pub use templates::{default_templates, TemplateConfig};
