//! Authoritative in-memory event repository.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::PersistenceMode;
use crate::core::persistence::{Persister, SharedBackend, Snapshot};
use crate::core::{Event, EventDraft, PublishedRefs, RollcallError};
use crate::util::ids::{EventId, MessageRef};

struct StoreState {
    events: HashMap<EventId, Event>,
    generation: u64,
}

impl StoreState {
    fn snapshot(&mut self) -> Snapshot {
        self.generation += 1;
        let mut events: Vec<Event> = self.events.values().cloned().collect();
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Snapshot {
            generation: self.generation,
            events: Arc::new(events),
        }
    }
}

/// Keyed repository of events; every successful mutation triggers a full
/// snapshot write through the [`Persister`].
pub struct EventStore {
    state: Mutex<StoreState>,
    persister: Persister,
}

impl EventStore {
    /// Load the snapshot from `backend` and wrap it with `persister`.
    ///
    /// A missing snapshot yields an empty store; an unreadable one is an error
    /// so it is never silently overwritten.
    pub fn open(backend: &SharedBackend, persister: Persister) -> Result<Self, RollcallError> {
        let loaded = backend.load()?;
        let mut events = HashMap::with_capacity(loaded.len());
        for event in loaded {
            if let Err(violation) = event.check_invariants() {
                tracing::warn!(event = %event.id, "loaded event violates invariants: {violation}");
            }
            events.insert(event.id, event);
        }
        tracing::info!(events = events.len(), "event store loaded");
        Ok(Self {
            state: Mutex::new(StoreState {
                events,
                generation: 0,
            }),
            persister,
        })
    }

    /// Durability contract in effect.
    #[must_use]
    pub const fn persistence_mode(&self) -> PersistenceMode {
        self.persister.mode()
    }

    /// Assign identity to a draft and persist it.
    pub async fn create(&self, draft: EventDraft) -> Result<Event, RollcallError> {
        draft.validate()?;
        let (event, snapshot) = {
            let mut state = self.state.lock();
            let mut id = EventId::new();
            while state.events.contains_key(&id) {
                id = EventId::new();
            }
            let event = draft.into_event(id);
            state.events.insert(id, event.clone());
            (event, state.snapshot())
        };
        tracing::info!(event = %event.id, title = %event.title, start = %event.start_time, "event created");
        self.persister.persist(snapshot).await;
        Ok(event)
    }

    /// Apply `f` to a copy of the event and commit it if `f` succeeds.
    ///
    /// Nothing is stored or persisted when `f` fails.
    pub async fn update<R, F>(&self, id: EventId, f: F) -> Result<(Event, R), RollcallError>
    where
        F: FnOnce(&mut Event) -> Result<R, RollcallError>,
    {
        let (event, out, snapshot) = {
            let mut state = self.state.lock();
            let current = state
                .events
                .get(&id)
                .ok_or(RollcallError::EventNotFound(id))?;
            let mut next = current.clone();
            let out = f(&mut next)?;
            state.events.insert(id, next.clone());
            (next, out, state.snapshot())
        };
        self.persister.persist(snapshot).await;
        Ok((event, out))
    }

    /// Backfill external references. Set once.
    pub async fn publish(&self, id: EventId, refs: PublishedRefs) -> Result<Event, RollcallError> {
        let (event, ()) = self
            .update(id, |event| {
                if event.is_published() {
                    return Err(RollcallError::AlreadyPublished(id));
                }
                event.message_id = Some(refs.message);
                event.thread_id = refs.thread;
                Ok(())
            })
            .await?;
        tracing::info!(event = %id, "event published");
        Ok(event)
    }

    /// Remove one event.
    pub async fn delete(&self, id: EventId) -> Option<Event> {
        let (removed, snapshot) = {
            let mut state = self.state.lock();
            let removed = state.events.remove(&id)?;
            (removed, state.snapshot())
        };
        self.persister.persist(snapshot).await;
        Some(removed)
    }

    /// Remove several events with a single snapshot write.
    pub async fn delete_many(&self, ids: &[EventId]) -> Vec<Event> {
        let (removed, snapshot) = {
            let mut state = self.state.lock();
            let removed: Vec<Event> = ids.iter().filter_map(|id| state.events.remove(id)).collect();
            if removed.is_empty() {
                return removed;
            }
            (removed, state.snapshot())
        };
        self.persister.persist(snapshot).await;
        removed
    }

    /// Copy of one event.
    #[must_use]
    pub fn get(&self, id: EventId) -> Option<Event> {
        self.state.lock().events.get(&id).cloned()
    }

    /// Whether `id` is stored.
    #[must_use]
    pub fn contains(&self, id: EventId) -> bool {
        self.state.lock().events.contains_key(&id)
    }

    /// Copies of all events ordered by start time then id.
    #[must_use]
    pub fn all(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.state.lock().events.values().cloned().collect();
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        events
    }

    /// Event published under `message`.
    #[must_use]
    pub fn find_by_message(&self, message: &MessageRef) -> Option<Event> {
        self.state
            .lock()
            .events
            .values()
            .find(|e| e.message_id.as_ref() == Some(message))
            .cloned()
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    /// Wait for pending snapshot writes and report the newest outcome.
    pub async fn flush(&self) -> Result<(), RollcallError> {
        self.persister.flush().await
    }
}
