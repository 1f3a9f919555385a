//! In-memory snapshot backend with fault injection.

use parking_lot::Mutex;

use crate::core::{Event, RollcallError, SnapshotBackend};

#[derive(Default)]
struct MemoryState {
    events: Option<Vec<Event>>,
    writes: usize,
    failed: usize,
    fail_next: usize,
}

/// Volatile snapshot for development and tests.
///
/// [`fail_next`](Self::fail_next) makes the following writes fail so retry
/// and failure reporting can be exercised deterministically.
#[derive(Default)]
pub struct InMemorySnapshot {
    state: Mutex<MemoryState>,
}

impl InMemorySnapshot {
    /// Empty backend with no prior snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a snapshot, as if written by an earlier process.
    #[must_use]
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                events: Some(events),
                ..MemoryState::default()
            }),
        }
    }

    /// Fail the next `count` writes.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }

    /// Failed writes so far.
    #[must_use]
    pub fn failed_writes(&self) -> usize {
        self.state.lock().failed
    }

    /// Last written snapshot, if any.
    #[must_use]
    pub fn last(&self) -> Option<Vec<Event>> {
        self.state.lock().events.clone()
    }
}

impl SnapshotBackend for InMemorySnapshot {
    fn load(&self) -> Result<Vec<Event>, RollcallError> {
        Ok(self.state.lock().events.clone().unwrap_or_default())
    }

    fn save(&self, events: &[Event]) -> Result<(), RollcallError> {
        let mut state = self.state.lock();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            state.failed += 1;
            return Err(RollcallError::Persistence("injected write failure".into()));
        }
        state.events = Some(events.to_vec());
        state.writes += 1;
        Ok(())
    }
}
