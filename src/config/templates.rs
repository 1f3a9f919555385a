//! Event template catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A reusable event shape: capacity, default length, and base roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Display name.
    pub name: String,
    /// Number of accepted seats.
    pub capacity: u32,
    /// Default duration in minutes.
    pub duration_minutes: u32,
    /// Base roles, in display order.
    pub roles: Vec<String>,
    /// Platform role pinged when an event of this template is posted.
    #[serde(default)]
    pub mention_role: Option<String>,
}

impl TemplateConfig {
    /// Build a template from borrowed parts.
    pub fn new(name: &str, capacity: u32, duration_minutes: u32, roles: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            capacity,
            duration_minutes,
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
            mention_role: None,
        }
    }

    /// Ping `role` when events of this template are posted.
    #[must_use]
    pub fn with_mention_role(mut self, role: impl Into<String>) -> Self {
        self.mention_role = Some(role.into());
        self
    }

    /// Mention markup for the configured role, if any.
    #[must_use]
    pub fn mention(&self) -> Option<String> {
        self.mention_role.as_ref().map(|id| format!("<@&{id}>"))
    }

    /// Validate template values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if self.roles.is_empty() {
            return Err("at least one role must be defined".into());
        }
        if self.roles.iter().any(|r| r.trim().is_empty()) {
            return Err("role names must not be blank".into());
        }
        if self.mention_role.as_ref().is_some_and(|r| r.trim().is_empty()) {
            return Err("mention_role must not be blank".into());
        }
        Ok(())
    }
}

const GROUP_ROLES: &[&str] = &["Any", "DPS", "Boon DPS", "Healer"];

/// Built-in catalog used when the config does not override it.
#[must_use]
pub fn default_templates() -> HashMap<String, TemplateConfig> {
    let mut fractal_roles = GROUP_ROLES.to_vec();
    fractal_roles.push("Glut");
    let mut raid_roles = GROUP_ROLES.to_vec();
    raid_roles.extend(["Tank", "Kite"]);

    HashMap::from([
        ("fractal".to_owned(), TemplateConfig::new("Fractal", 5, 120, &fractal_roles)),
        ("raid".to_owned(), TemplateConfig::new("Raid", 10, 120, &raid_roles)),
        ("party".to_owned(), TemplateConfig::new("Party", 5, 90, GROUP_ROLES)),
        ("squad".to_owned(), TemplateConfig::new("Squad", 10, 90, GROUP_ROLES)),
        ("freeform".to_owned(), TemplateConfig::new("Freeform", 20, 60, GROUP_ROLES)),
    ])
}
