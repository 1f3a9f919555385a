//! API-facing request/response models.

use serde::{Deserialize, Serialize};

use crate::config::PersistenceMode;
use crate::core::{
    Coordinator, MembershipChange, Placement, RestoreReport, RoleAction, Spawn,
};
use crate::util::ids::{EventId, UserId};

/// Button press from the command layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    /// Event identifier.
    pub event_id: EventId,
    /// User who pressed.
    pub user_id: UserId,
    /// Role toggled.
    pub role: String,
}

/// What the command layer needs to re-render after a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// Event identifier.
    pub event_id: EventId,
    /// Whether the role was added or removed.
    pub action: RoleAction,
    /// Where the user now sits.
    pub placement: Placement,
    /// Accepted count.
    pub accepted: usize,
    /// Capacity.
    pub capacity: u32,
    /// Waitlist length.
    pub waitlisted: usize,
    /// User moved off the waitlist by this toggle.
    pub promoted: Option<UserId>,
}

/// Boot recovery counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreSummary {
    /// Events with re-armed timers.
    pub restored: usize,
    /// Reminders re-armed.
    pub reminders_armed: usize,
    /// Events retired because their deadline had passed.
    pub retired: usize,
}

impl From<&RestoreReport> for RestoreSummary {
    fn from(report: &RestoreReport) -> Self {
        Self {
            restored: report.restored.len(),
            reminders_armed: report
                .restored
                .iter()
                .filter(|r| r.reminder_at.is_some())
                .count(),
            retired: report.immediately_retired.len(),
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Events in the store.
    pub events: usize,
    /// Durability contract in effect.
    pub persistence: PersistenceMode,
}

/// Apply a toggle request.
pub async fn toggle<S: Spawn>(
    coordinator: &Coordinator<S>,
    req: ToggleRequest,
) -> Result<ToggleResponse, String> {
    let (event, outcome) = coordinator
        .toggle_role_detailed(req.event_id, &req.user_id, &req.role)
        .await
        .map_err(|e| e.to_string())?;
    let promoted = outcome.membership.iter().find_map(|c| match c {
        MembershipChange::Promoted(user) => Some(user.clone()),
        _ => None,
    });
    Ok(ToggleResponse {
        event_id: event.id,
        action: outcome.action,
        placement: outcome.after,
        accepted: event.signups.len(),
        capacity: event.capacity,
        waitlisted: event.waitlist.len(),
        promoted,
    })
}

/// Run boot recovery and summarize it.
pub async fn restore<S: Spawn>(coordinator: &Coordinator<S>) -> RestoreSummary {
    RestoreSummary::from(&coordinator.restore_on_boot().await)
}

/// Return a health payload.
pub fn health<S: Spawn>(coordinator: &Coordinator<S>) -> Health {
    Health {
        ok: true,
        events: coordinator.store().len(),
        persistence: coordinator.store().persistence_mode(),
    }
}
