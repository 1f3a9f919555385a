//! Lifecycle timers.
//!
//! Each event owns at most one pending reminder and at most one pending
//! cleanup. Arming a task for an (event, kind) pair replaces whatever was
//! pending. Deferred waits run on the tokio timer; "now" comes from the
//! injected [`Clock`](crate::util::Clock), so restart classification and
//! past-due checks are deterministic under test.
//!
//! A task body takes the event's lock before doing anything, then checks
//! that it is still the current task for its slot. A replaced or cancelled
//! task, or one whose event is gone, does nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::config::TimingConfig;
use crate::core::audit::{AuditAction, AuditLog};
use crate::core::collaborator::SharedCollaborator;
use crate::core::locks::{EventGuard, EventLocks};
use crate::core::{Event, EventStore, Spawn};
use crate::util::clock::SharedClock;
use crate::util::ids::EventId;

/// Class of deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Pre-start notification.
    Reminder,
    /// Post-start teardown.
    Cleanup,
}

/// Outcome of a cleanup scheduling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "at")]
pub enum CleanupSchedule {
    /// Deferred until the instant.
    Armed(DateTime<Utc>),
    /// Deadline already passed; the event was retired in-line.
    RanImmediately,
}

/// What restart recovery does with one persisted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootAction {
    /// Cleanup deadline elapsed: delete without arming anything.
    Retire,
    /// Not started yet: arm reminder and cleanup.
    ArmBoth,
    /// Started but not yet due for cleanup: arm cleanup only.
    ArmCleanup,
}

impl BootAction {
    /// Classify `event` at `now`.
    #[must_use]
    pub fn classify(event: &Event, now: DateTime<Utc>, timing: &TimingConfig) -> Self {
        if event.cleanup_at(timing.cleanup_grace()) <= now {
            Self::Retire
        } else if now < event.start_time {
            Self::ArmBoth
        } else {
            Self::ArmCleanup
        }
    }
}

/// An event whose timers were re-armed on boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoredEvent {
    /// Event id.
    pub id: EventId,
    /// Classification applied.
    pub action: BootAction,
    /// Reminder instant, if one was armed.
    pub reminder_at: Option<DateTime<Utc>>,
    /// Cleanup instant.
    pub cleanup_at: DateTime<Utc>,
}

/// Result of restart recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Events with re-armed timers.
    pub restored: Vec<RestoredEvent>,
    /// Events deleted because their cleanup deadline had passed.
    pub immediately_retired: Vec<EventId>,
}

struct TaskEntry {
    generation: u64,
    fire_at: DateTime<Utc>,
    _cancel: oneshot::Sender<()>,
}

struct SchedulerInner {
    store: Arc<EventStore>,
    locks: Arc<EventLocks>,
    collaborator: SharedCollaborator,
    clock: SharedClock,
    timing: TimingConfig,
    audit: AuditLog,
    tasks: Mutex<HashMap<(EventId, TaskKind), TaskEntry>>,
    generations: AtomicU64,
}

/// Owns the reminder and cleanup task table.
pub struct Scheduler<S> {
    inner: Arc<SchedulerInner>,
    spawner: S,
}

impl<S: Clone> Clone for Scheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            spawner: self.spawner.clone(),
        }
    }
}

impl<S> Scheduler<S>
where
    S: Spawn,
{
    /// Scheduler over a store, serialized through `locks`.
    pub fn new(
        store: Arc<EventStore>,
        locks: Arc<EventLocks>,
        collaborator: SharedCollaborator,
        clock: SharedClock,
        timing: TimingConfig,
        spawner: S,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                locks,
                collaborator,
                clock,
                timing,
                audit: AuditLog::default(),
                tasks: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
            spawner,
        }
    }

    /// Attach an audit log. Must be called before any task is armed.
    #[must_use]
    pub fn with_audit(self, audit: AuditLog) -> Self {
        let inner = Arc::try_unwrap(self.inner).map_or_else(
            |shared| {
                tracing::warn!("scheduler already shared; audit log not attached");
                shared
            },
            |mut inner| {
                inner.audit = audit;
                Arc::new(inner)
            },
        );
        Self {
            inner,
            spawner: self.spawner,
        }
    }

    /// Arm the reminder at `start - lead`, replacing a pending one.
    ///
    /// Returns the fire instant, or `None` when that instant has already
    /// passed; a reminder is never sent late.
    pub fn schedule_reminder(&self, event: &Event) -> Option<DateTime<Utc>> {
        let at = event.reminder_at(self.inner.timing.reminder_lead());
        if at <= self.inner.clock.now() {
            self.inner.cancel(event.id, TaskKind::Reminder);
            tracing::info!(event = %event.id, %at, "reminder time already passed, skipping");
            return None;
        }
        self.arm(event.id, TaskKind::Reminder, at);
        Some(at)
    }

    /// Arm the cleanup at `start + grace`, replacing a pending one. A deadline
    /// that has already passed retires the event before this returns.
    pub async fn schedule_cleanup(&self, event: &Event) -> CleanupSchedule {
        let at = event.cleanup_at(self.inner.timing.cleanup_grace());
        if at <= self.inner.clock.now() {
            tracing::info!(event = %event.id, %at, "cleanup deadline already passed, retiring now");
            self.inner.retire(event.id).await;
            return CleanupSchedule::RanImmediately;
        }
        self.arm(event.id, TaskKind::Cleanup, at);
        CleanupSchedule::Armed(at)
    }

    /// Arm both tasks.
    pub async fn schedule(&self, event: &Event) -> (Option<DateTime<Utc>>, CleanupSchedule) {
        let reminder = self.schedule_reminder(event);
        let cleanup = self.schedule_cleanup(event).await;
        (reminder, cleanup)
    }

    /// Cancel one pending task. Returns whether one was pending.
    pub fn cancel(&self, id: EventId, kind: TaskKind) -> bool {
        self.inner.cancel(id, kind)
    }

    /// Cancel both pending tasks of an event.
    pub fn cancel_all(&self, id: EventId) {
        self.inner.cancel_all(id);
    }

    /// Pending tasks of an event with their fire instants.
    #[must_use]
    pub fn pending(&self, id: EventId) -> Vec<(TaskKind, DateTime<Utc>)> {
        let tasks = self.inner.tasks.lock();
        [TaskKind::Reminder, TaskKind::Cleanup]
            .into_iter()
            .filter_map(|kind| tasks.get(&(id, kind)).map(|t| (kind, t.fire_at)))
            .collect()
    }

    /// Whether a task of `kind` is pending for `id`.
    #[must_use]
    pub fn is_armed(&self, id: EventId, kind: TaskKind) -> bool {
        self.inner.tasks.lock().contains_key(&(id, kind))
    }

    /// Total pending tasks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.tasks.lock().len()
    }

    /// Tear an event down now: delete its artifacts, delete it from the
    /// store, cancel its tasks. `None` if it was already gone.
    pub async fn retire(&self, id: EventId) -> Option<Event> {
        self.inner.retire(id).await
    }

    /// Rebuild the task table from the store after a restart.
    pub async fn restore_on_boot(&self) -> RestoreReport {
        let now = self.inner.clock.now();
        let mut report = RestoreReport::default();
        let mut expired = Vec::new();

        for event in self.inner.store.all() {
            let action = BootAction::classify(&event, now, &self.inner.timing);
            let cleanup_at = event.cleanup_at(self.inner.timing.cleanup_grace());
            let reminder_at = match action {
                BootAction::Retire => {
                    expired.push(event);
                    continue;
                }
                BootAction::ArmBoth => self.schedule_reminder(&event),
                BootAction::ArmCleanup => None,
            };
            self.arm(event.id, TaskKind::Cleanup, cleanup_at);
            tracing::debug!(event = %event.id, ?action, "timers restored");
            report.restored.push(RestoredEvent {
                id: event.id,
                action,
                reminder_at,
                cleanup_at,
            });
        }

        report.immediately_retired = self.inner.retire_batch(expired).await;
        tracing::info!(
            restored = report.restored.len(),
            retired = report.immediately_retired.len(),
            "boot recovery complete"
        );
        report
    }

    fn arm(&self, id: EventId, kind: TaskKind, fire_at: DateTime<Utc>) {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = (fire_at - self.inner.clock.now()).to_std().unwrap_or_default();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let replaced = self.inner.tasks.lock().insert(
            (id, kind),
            TaskEntry {
                generation,
                fire_at,
                _cancel: cancel_tx,
            },
        );
        if replaced.is_some() {
            tracing::debug!(event = %id, ?kind, "replaced pending task");
        }
        tracing::debug!(event = %id, ?kind, %fire_at, ?delay, "task armed");

        let inner = Arc::clone(&self.inner);
        self.spawner.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => inner.fire(id, kind, generation).await,
                _ = cancel_rx => tracing::debug!(event = %id, ?kind, "task cancelled"),
            }
        });
    }
}

impl SchedulerInner {
    fn cancel(&self, id: EventId, kind: TaskKind) -> bool {
        self.tasks.lock().remove(&(id, kind)).is_some()
    }

    fn cancel_all(&self, id: EventId) {
        let mut tasks = self.tasks.lock();
        tasks.remove(&(id, TaskKind::Reminder));
        tasks.remove(&(id, TaskKind::Cleanup));
    }

    /// Remove the slot entry if it still belongs to `generation`.
    fn claim(&self, id: EventId, kind: TaskKind, generation: u64) -> bool {
        let mut tasks = self.tasks.lock();
        match tasks.get(&(id, kind)) {
            Some(entry) if entry.generation == generation => {
                tasks.remove(&(id, kind));
                true
            }
            _ => false,
        }
    }

    async fn fire(&self, id: EventId, kind: TaskKind, generation: u64) {
        let guard = self.locks.lock(id).await;
        if !self.claim(id, kind, generation) {
            tracing::debug!(event = %id, ?kind, "task superseded before firing");
            return;
        }
        match kind {
            TaskKind::Reminder => self.send_reminder(id).await,
            TaskKind::Cleanup => {
                self.retire_locked(id, guard).await;
            }
        }
    }

    async fn send_reminder(&self, id: EventId) {
        let Some(event) = self.store.get(id) else {
            tracing::debug!(event = %id, "reminder fired for deleted event");
            return;
        };
        let Some(thread) = &event.thread_id else {
            tracing::warn!(event = %id, "no discussion thread, reminder dropped");
            return;
        };
        let text = reminder_text(&event, self.timing.reminder_lead_minutes);
        match self.collaborator.notify(thread, &text).await {
            Ok(()) => {
                tracing::info!(event = %id, mentioned = event.signups.len(), "reminder sent");
                self.audit.record(
                    id,
                    AuditAction::Reminded,
                    None,
                    Some(format!("{} mentioned", event.signups.len())),
                    self.clock.now(),
                );
            }
            Err(e) => tracing::warn!(event = %id, "reminder delivery failed: {e}"),
        }
    }

    async fn retire(&self, id: EventId) -> Option<Event> {
        let guard = self.locks.lock(id).await;
        self.retire_locked(id, guard).await
    }

    async fn retire_locked(&self, id: EventId, guard: EventGuard) -> Option<Event> {
        let Some(event) = self.store.get(id) else {
            tracing::debug!(event = %id, "cleanup for deleted event");
            self.cancel_all(id);
            drop(guard);
            self.locks.release(id);
            return None;
        };
        self.teardown(&event).await;
        let removed = self.store.delete(id).await;
        self.cancel_all(id);
        drop(guard);
        self.locks.release(id);
        self.audit
            .record(id, AuditAction::Retired, None, None, self.clock.now());
        tracing::info!(event = %id, title = %event.title, "event retired");
        removed
    }

    async fn retire_batch(&self, mut events: Vec<Event>) -> Vec<EventId> {
        if events.is_empty() {
            return Vec::new();
        }
        events.sort_by_key(|e| e.id);
        let mut guards = Vec::with_capacity(events.len());
        for event in &events {
            guards.push(self.locks.lock(event.id).await);
            self.teardown(event).await;
        }
        let ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
        let removed = self.store.delete_many(&ids).await;
        for id in &ids {
            self.cancel_all(*id);
        }
        drop(guards);
        for id in &ids {
            self.locks.release(*id);
        }
        let now = self.clock.now();
        for event in &removed {
            self.audit
                .record(event.id, AuditAction::Retired, None, Some("boot".into()), now);
            tracing::info!(event = %event.id, title = %event.title, "stale event retired on boot");
        }
        removed.into_iter().map(|e| e.id).collect()
    }

    /// Delete the message and the thread; each failure is independent.
    async fn teardown(&self, event: &Event) {
        if let Some(message) = &event.message_id {
            if let Err(e) = self.collaborator.delete_message(message).await {
                tracing::warn!(event = %event.id, "failed to delete message: {e}");
            }
        }
        if let Some(thread) = &event.thread_id {
            if let Err(e) = self.collaborator.delete_thread(thread).await {
                tracing::warn!(event = %event.id, "failed to delete thread: {e}");
            }
        }
    }
}

/// Reminder text mentioning every accepted user.
#[must_use]
pub fn reminder_text(event: &Event, lead_minutes: u32) -> String {
    let mentions: Vec<String> = event
        .signups
        .iter()
        .map(|s| format!("<@{}>", s.user_id))
        .collect();
    let body = format!("Event \"{}\" starts in {lead_minutes} minutes!", event.title);
    if mentions.is_empty() {
        body
    } else {
        format!("{} {body}", mentions.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_templates;
    use crate::core::{EventDraft, Origin, Signup};
    use crate::util::ids::UserId;
    use chrono::Duration;

    fn event_at(start: DateTime<Utc>) -> Event {
        EventDraft::from_template(
            "party",
            &default_templates()["party"],
            "Run",
            start,
            None,
            &[],
            Origin::default(),
        )
        .unwrap()
        .into_event(EventId::new())
    }

    #[test]
    fn classification_boundaries() {
        let timing = TimingConfig::default();
        let now = Utc::now();
        let classify = |start| BootAction::classify(&event_at(start), now, &timing);

        assert_eq!(classify(now - Duration::hours(10)), BootAction::Retire);
        assert_eq!(classify(now - Duration::minutes(150)), BootAction::Retire);
        assert_eq!(classify(now - Duration::minutes(149)), BootAction::ArmCleanup);
        assert_eq!(classify(now), BootAction::ArmCleanup);
        assert_eq!(classify(now + Duration::hours(1)), BootAction::ArmBoth);
    }

    #[test]
    fn reminder_text_mentions_accepted_only() {
        let mut event = event_at(Utc::now());
        assert_eq!(reminder_text(&event, 15), "Event \"Run\" starts in 15 minutes!");

        event.signups.push(Signup::new(UserId::from("1"), "DPS", Utc::now()));
        event.signups.push(Signup::new(UserId::from("2"), "Any", Utc::now()));
        assert_eq!(
            reminder_text(&event, 15),
            "<@1> <@2> Event \"Run\" starts in 15 minutes!"
        );
    }
}
