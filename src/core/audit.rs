//! Audit trail of lifecycle actions.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::ids::{EventId, UserId};

/// Lifecycle action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Event created from a draft.
    Created,
    /// External references backfilled.
    Published,
    /// User took a seat.
    Joined,
    /// User parked on the waitlist.
    Waitlisted,
    /// User added or dropped a role without changing placement.
    RoleChanged,
    /// User left the event.
    Left,
    /// Waitlisted user moved into a seat.
    Promoted,
    /// Reminder delivered.
    Reminded,
    /// Event torn down.
    Retired,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Published => "published",
            Self::Joined => "joined",
            Self::Waitlisted => "waitlisted",
            Self::RoleChanged => "role_changed",
            Self::Left => "left",
            Self::Promoted => "promoted",
            Self::Reminded => "reminded",
            Self::Retired => "retired",
        };
        f.write_str(name)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event the action applies to.
    pub event_id: EventId,
    /// Action taken.
    pub action: AuditAction,
    /// User concerned, if any.
    pub user: Option<UserId>,
    /// Additional context.
    pub detail: Option<String>,
    /// When the action was recorded.
    pub at: DateTime<Utc>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink with a bounded buffer; the oldest entries drop first.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink shared between the components that write to it.
pub type SharedAuditSink = Arc<Mutex<dyn AuditSink>>;

/// Optional audit handle; recording is a no-op when no sink is attached.
#[derive(Clone, Default)]
pub struct AuditLog {
    sink: Option<SharedAuditSink>,
}

impl AuditLog {
    /// Log writing to `sink`.
    #[must_use]
    pub fn new(sink: SharedAuditSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// Whether a sink is attached.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Record one action.
    pub fn record(
        &self,
        event_id: EventId,
        action: AuditAction,
        user: Option<&UserId>,
        detail: Option<String>,
        at: DateTime<Utc>,
    ) {
        if let Some(sink) = &self.sink {
            sink.lock().record(build_audit_event(event_id, action, user.cloned(), detail, at));
        }
    }
}

/// Helper to build an audit event from context.
#[must_use]
pub const fn build_audit_event(
    event_id: EventId,
    action: AuditAction,
    user: Option<UserId>,
    detail: Option<String>,
    at: DateTime<Utc>,
) -> AuditEvent {
    AuditEvent {
        event_id,
        action,
        user,
        detail,
        at,
    }
}
