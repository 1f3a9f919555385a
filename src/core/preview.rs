//! Staging area for drafts awaiting confirmation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{EventDraft, Origin};
use crate::util::clock::SharedClock;
use crate::util::ids::PreviewId;

/// A staged draft. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    /// Draft as it will be created.
    pub draft: EventDraft,
    /// When the draft was staged.
    pub created_at: DateTime<Utc>,
}

impl Preview {
    /// Where the draft came from.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.draft.origin
    }

    /// Whether the preview is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// TTL map of staged drafts.
///
/// `get` and `has` do not look at age; expired entries disappear on the next
/// `store` or explicit `sweep`.
pub struct PreviewManager {
    ttl: Duration,
    clock: SharedClock,
    entries: Mutex<HashMap<PreviewId, Preview>>,
}

impl PreviewManager {
    /// Empty manager with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Configured TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sweep, then stage `draft` under `id`, replacing any previous entry.
    pub fn store(&self, id: PreviewId, draft: EventDraft) -> Preview {
        self.sweep();
        let preview = Preview {
            draft,
            created_at: self.clock.now(),
        };
        self.entries.lock().insert(id.clone(), preview.clone());
        tracing::debug!(preview = %id, "preview staged");
        preview
    }

    /// Stage under a freshly generated id.
    pub fn stage(&self, draft: EventDraft) -> PreviewId {
        let id = PreviewId::generate(&draft.origin.author_id);
        self.store(id.clone(), draft);
        id
    }

    /// Copy of a staged preview.
    #[must_use]
    pub fn get(&self, id: &PreviewId) -> Option<Preview> {
        self.entries.lock().get(id).cloned()
    }

    /// Whether `id` is staged.
    #[must_use]
    pub fn has(&self, id: &PreviewId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Discard a preview. Returns whether one was staged.
    pub fn delete(&self, id: &PreviewId) -> bool {
        self.entries.lock().remove(id).is_some()
    }

    /// Sweep, then remove and return a preview.
    pub fn take(&self, id: &PreviewId) -> Option<Preview> {
        self.sweep();
        self.entries.lock().remove(id)
    }

    /// Drop every preview older than the TTL. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, p| !p.is_expired(now, self.ttl));
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!(swept, "expired previews swept");
        }
        swept
    }

    /// Number of staged previews.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
