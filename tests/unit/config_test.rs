//! Tests for configuration validation

use std::path::PathBuf;

use prometheus_rollcall::config::{
    default_templates, PersistenceMode, RetryConfig, RollcallConfig, SnapshotBackendConfig,
    TemplateConfig, TimingConfig,
};

#[test]
fn test_default_config_is_valid() {
    let config = RollcallConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.persistence.mode, PersistenceMode::WriteBehind);
    assert_eq!(
        config.persistence.backend,
        SnapshotBackendConfig::JsonFile {
            path: PathBuf::from("data").join("events.json")
        }
    );
}

#[test]
fn test_timing_defaults() {
    let timing = TimingConfig::default();
    assert_eq!(timing.reminder_lead(), chrono::Duration::minutes(15));
    assert_eq!(timing.cleanup_grace(), chrono::Duration::minutes(150));
    assert_eq!(timing.preview_ttl(), chrono::Duration::minutes(15));
}

#[test]
fn test_template_config_invalid_capacity() {
    let invalid = TemplateConfig::new("Broken", 0, 60, &["Any"]);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_template_config_no_roles() {
    let invalid = TemplateConfig::new("Broken", 5, 60, &[]);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_default_catalog() {
    let templates = default_templates();
    assert_eq!(templates.len(), 5);
    assert_eq!(templates["raid"].capacity, 10);
    assert!(templates["raid"].roles.contains(&"Kite".to_string()));
    assert_eq!(templates["freeform"].capacity, 20);
}

#[test]
fn test_config_empty_templates() {
    let mut config = RollcallConfig::default();
    config.templates.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_zero_retry_attempts() {
    let mut config = RollcallConfig::default();
    config.persistence.retry = RetryConfig {
        max_attempts: 0,
        ..RetryConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "timing": { "reminder_lead_minutes": 30, "cleanup_grace_minutes": 120, "preview_ttl_minutes": 5 },
        "persistence": {
            "backend": { "kind": "in_memory" },
            "mode": "write_through",
            "retry": { "max_attempts": 5 }
        }
    }"#;
    let config = RollcallConfig::from_json_str(json).unwrap();
    assert_eq!(config.timing.reminder_lead_minutes, 30);
    assert_eq!(config.persistence.backend, SnapshotBackendConfig::InMemory);
    assert_eq!(config.persistence.mode, PersistenceMode::WriteThrough);
    assert_eq!(config.persistence.retry.max_attempts, 5);
    assert_eq!(config.persistence.retry.initial_backoff_ms, 100);
    // catalog falls back to the defaults
    assert_eq!(config.templates.len(), 5);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    let json = r#"{ "timing": { "preview_ttl_minutes": 0 } }"#;
    assert!(RollcallConfig::from_json_str(json).is_err());
    assert!(RollcallConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollcall.json");
    std::fs::write(&path, r#"{ "persistence": { "backend": { "kind": "json_file", "path": "/tmp/x.json" } } }"#)
        .unwrap();
    let config = RollcallConfig::load(&path).unwrap();
    assert_eq!(config.persistence.mode, PersistenceMode::WriteBehind);

    let missing = RollcallConfig::load(dir.path().join("absent.json"));
    assert!(missing.is_err());
}
