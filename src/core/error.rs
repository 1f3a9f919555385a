//! Error types for registration, scheduling, and persistence.

use thiserror::Error;

use crate::util::ids::{EventId, PreviewId};

/// Errors produced by rollcall components.
#[derive(Debug, Error)]
pub enum RollcallError {
    /// Event is not (or no longer) in the store.
    #[error("event not found: {0}")]
    EventNotFound(EventId),
    /// Preview is absent or has expired.
    #[error("preview not found: {0}")]
    PreviewNotFound(PreviewId),
    /// Role is not offered by the event.
    #[error("role `{role}` is not offered by event {event}")]
    UnknownRole {
        /// Event the toggle targeted.
        event: EventId,
        /// Requested role.
        role: String,
    },
    /// External references were already backfilled.
    #[error("event already published: {0}")]
    AlreadyPublished(EventId),
    /// Template key is not in the catalog.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
    /// Draft violates a structural rule (capacity, roles).
    #[error("invalid draft: {0}")]
    InvalidDraft(String),
    /// External collaborator call failed.
    #[error("collaborator failure: {0}")]
    Collaborator(String),
    /// Snapshot read or write failed.
    #[error("persistence failure: {0}")]
    Persistence(String),
    /// Configuration could not be parsed or validated.
    #[error("config error: {0}")]
    Config(String),
}

impl RollcallError {
    /// True for lookups that missed.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound(_) | Self::PreviewNotFound(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
