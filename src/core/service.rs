//! Coordinator facade.
//!
//! Wires the store, the registration engine, the scheduler and the preview
//! staging area around one lock table and one clock, and records lifecycle
//! actions to the audit log when one is attached.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{TemplateConfig, TimingConfig};
use crate::core::audit::{AuditAction, AuditLog, SharedAuditSink};
use crate::core::collaborator::SharedCollaborator;
use crate::core::locks::EventLocks;
use crate::core::preview::{Preview, PreviewManager};
use crate::core::scheduler::{CleanupSchedule, RestoreReport, Scheduler, TaskKind};
use crate::core::signup::{MembershipChange, SignupEngine, ToggleOutcome};
use crate::core::{
    Event, EventDraft, EventStore, Origin, Placement, PublishedRefs, RollcallError, Spawn,
};
use crate::util::clock::SharedClock;
use crate::util::ids::{EventId, MessageRef, PreviewId, UserId};

/// Single entry point for the command layer.
pub struct Coordinator<S> {
    store: Arc<EventStore>,
    engine: SignupEngine,
    scheduler: Scheduler<S>,
    locks: Arc<EventLocks>,
    previews: PreviewManager,
    templates: HashMap<String, TemplateConfig>,
    clock: SharedClock,
    audit: AuditLog,
}

impl<S> Coordinator<S>
where
    S: Spawn,
{
    /// Coordinator over an opened store.
    pub fn new(
        store: Arc<EventStore>,
        collaborator: SharedCollaborator,
        clock: SharedClock,
        timing: TimingConfig,
        templates: HashMap<String, TemplateConfig>,
        spawner: S,
    ) -> Self {
        let locks = Arc::new(EventLocks::new());
        let engine = SignupEngine::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            Arc::clone(&collaborator),
            Arc::clone(&clock),
        );
        let scheduler = Scheduler::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            collaborator,
            Arc::clone(&clock),
            timing.clone(),
            spawner,
        );
        let previews = PreviewManager::new(timing.preview_ttl(), Arc::clone(&clock));
        Self {
            store,
            engine,
            scheduler,
            locks,
            previews,
            templates,
            clock,
            audit: AuditLog::default(),
        }
    }

    /// Record lifecycle actions to `sink`. Call before arming any timer.
    #[must_use]
    pub fn with_audit(mut self, sink: SharedAuditSink) -> Self {
        self.audit = AuditLog::new(sink);
        self.scheduler = self.scheduler.with_audit(self.audit.clone());
        self
    }

    /// Template catalog.
    #[must_use]
    pub const fn templates(&self) -> &HashMap<String, TemplateConfig> {
        &self.templates
    }

    /// Build a draft from a catalog template.
    pub fn draft(
        &self,
        template: &str,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        duration_minutes: Option<u32>,
        custom_roles: &[String],
        origin: Origin,
    ) -> Result<EventDraft, RollcallError> {
        let config = self
            .templates
            .get(template)
            .ok_or_else(|| RollcallError::UnknownTemplate(template.to_owned()))?;
        EventDraft::from_template(
            template,
            config,
            title,
            start_time,
            duration_minutes,
            custom_roles,
            origin,
        )
    }

    /// Create and persist an event.
    pub async fn create_event(&self, draft: EventDraft) -> Result<Event, RollcallError> {
        let event = self.store.create(draft).await?;
        self.audit.record(
            event.id,
            AuditAction::Created,
            Some(&event.creator_id),
            Some(event.title.clone()),
            self.clock.now(),
        );
        Ok(event)
    }

    /// Backfill the external references of a freshly posted event.
    pub async fn publish(&self, id: EventId, refs: PublishedRefs) -> Result<Event, RollcallError> {
        let event = self.store.publish(id, refs).await?;
        self.audit
            .record(id, AuditAction::Published, None, None, self.clock.now());
        Ok(event)
    }

    /// Toggle `role` for `user` and return the updated event.
    pub async fn toggle_role(
        &self,
        id: EventId,
        user: &UserId,
        role: &str,
    ) -> Result<Event, RollcallError> {
        self.toggle_role_detailed(id, user, role)
            .await
            .map(|(event, _)| event)
    }

    /// Toggle `role` for `user` and return the event with what changed.
    pub async fn toggle_role_detailed(
        &self,
        id: EventId,
        user: &UserId,
        role: &str,
    ) -> Result<(Event, ToggleOutcome), RollcallError> {
        let (event, outcome) = self.engine.toggle(id, user, role).await?;
        self.record_toggle(id, &outcome);
        Ok((event, outcome))
    }

    fn record_toggle(&self, id: EventId, outcome: &ToggleOutcome) {
        if !self.audit.is_enabled() {
            return;
        }
        let now = self.clock.now();
        let action = match (outcome.before, outcome.after) {
            (Placement::Absent, Placement::Accepted) => AuditAction::Joined,
            (Placement::Absent, Placement::Waitlisted) => AuditAction::Waitlisted,
            (_, Placement::Absent) => AuditAction::Left,
            _ => AuditAction::RoleChanged,
        };
        self.audit
            .record(id, action, Some(&outcome.user), Some(outcome.role.clone()), now);
        for change in &outcome.membership {
            if let MembershipChange::Promoted(user) = change {
                self.audit
                    .record(id, AuditAction::Promoted, Some(user), None, now);
            }
        }
    }

    /// Arm the reminder. `None` if its instant already passed.
    pub fn schedule_reminder(&self, event: &Event) -> Option<DateTime<Utc>> {
        self.scheduler.schedule_reminder(event)
    }

    /// Arm the cleanup, or retire now if the deadline passed.
    pub async fn schedule_cleanup(&self, event: &Event) -> CleanupSchedule {
        self.scheduler.schedule_cleanup(event).await
    }

    /// Arm both lifecycle tasks.
    pub async fn schedule(&self, event: &Event) -> (Option<DateTime<Utc>>, CleanupSchedule) {
        self.scheduler.schedule(event).await
    }

    /// Pending lifecycle tasks of an event.
    #[must_use]
    pub fn pending(&self, id: EventId) -> Vec<(TaskKind, DateTime<Utc>)> {
        self.scheduler.pending(id)
    }

    /// Rebuild timers from the persisted store.
    pub async fn restore_on_boot(&self) -> RestoreReport {
        self.scheduler.restore_on_boot().await
    }

    /// Administrative delete: tear down artifacts, remove, cancel timers.
    pub async fn delete_event(&self, id: EventId) -> Result<Event, RollcallError> {
        self.scheduler
            .retire(id)
            .await
            .ok_or(RollcallError::EventNotFound(id))
    }

    /// Stage a draft under `id`.
    pub fn store_preview(&self, id: PreviewId, draft: EventDraft) -> Preview {
        self.previews.store(id, draft)
    }

    /// Stage a draft under a generated id.
    pub fn stage_preview(&self, draft: EventDraft) -> PreviewId {
        self.previews.stage(draft)
    }

    /// Staged preview, regardless of age.
    #[must_use]
    pub fn get_preview(&self, id: &PreviewId) -> Option<Preview> {
        self.previews.get(id)
    }

    /// Whether a preview is staged, regardless of age.
    #[must_use]
    pub fn has_preview(&self, id: &PreviewId) -> bool {
        self.previews.has(id)
    }

    /// Discard a preview.
    pub fn delete_preview(&self, id: &PreviewId) -> bool {
        self.previews.delete(id)
    }

    /// Create the event staged under `id`. Expired previews are not accepted.
    pub async fn confirm_preview(&self, id: &PreviewId) -> Result<Event, RollcallError> {
        let preview = self
            .previews
            .take(id)
            .ok_or_else(|| RollcallError::PreviewNotFound(id.clone()))?;
        tracing::info!(preview = %id, "preview confirmed");
        self.create_event(preview.draft).await
    }

    /// Copy of one event.
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<Event> {
        self.store.get(id)
    }

    /// All events by start time.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.store.all()
    }

    /// Event published under `message`.
    #[must_use]
    pub fn event_by_message(&self, message: &MessageRef) -> Option<Event> {
        self.store.find_by_message(message)
    }

    /// Wait for outstanding snapshot writes.
    pub async fn flush(&self) -> Result<(), RollcallError> {
        self.store.flush().await
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<EventStore> {
        &self.store
    }

    /// Underlying scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler<S> {
        &self.scheduler
    }

    /// Per-event lock table shared by the engine and the scheduler.
    #[must_use]
    pub const fn locks(&self) -> &Arc<EventLocks> {
        &self.locks
    }
}
