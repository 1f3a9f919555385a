//! Per-event mutual exclusion.
//!
//! Registration changes and lifecycle tasks await platform calls mid-way, so
//! two triggers for the same event could interleave at those await points.
//! Each event id gets its own async mutex; holders for different ids never
//! contend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::util::ids::EventId;

/// Guard serializing work on one event id.
pub type EventGuard = OwnedMutexGuard<()>;

/// Table of per-event async mutexes.
#[derive(Default)]
pub struct EventLocks {
    slots: Mutex<HashMap<EventId, Arc<AsyncMutex<()>>>>,
}

impl EventLocks {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`. Waiters are served in FIFO order.
    pub async fn lock(&self, id: EventId) -> EventGuard {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(id).or_default())
        };
        slot.lock_owned().await
    }

    /// Drop the slot for a retired event once nobody holds or waits on it.
    pub fn release(&self, id: EventId) {
        let mut slots = self.slots.lock();
        if slots.get(&id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(&id);
        }
    }

    /// Number of tracked ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no id is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}
