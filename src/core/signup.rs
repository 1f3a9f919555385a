//! Registration engine.
//!
//! Same shape as a capacity pool: a join is admitted while seats remain and
//! parked on the waitlist otherwise; releasing a seat wakes the oldest parked
//! signup. There is no "full" error, overflow always lands on the waitlist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::collaborator::SharedCollaborator;
use crate::core::locks::EventLocks;
use crate::core::{Event, EventStore, Placement, RollcallError, Signup};
use crate::util::clock::SharedClock;
use crate::util::ids::{EventId, ThreadRef, UserId};

/// What a toggle did to the requested role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleAction {
    /// The role was added (new signup or extra role).
    Added,
    /// The role was dropped.
    Removed,
}

/// Change in accepted membership caused by a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "change", content = "user")]
pub enum MembershipChange {
    /// User took a free seat.
    Joined(UserId),
    /// Accepted user dropped their last role.
    Left(UserId),
    /// Head of the waitlist moved into the freed seat.
    Promoted(UserId),
}

impl MembershipChange {
    /// User the change applies to.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        match self {
            Self::Joined(u) | Self::Left(u) | Self::Promoted(u) => u,
        }
    }

    /// Whether the user gained access to the discussion thread.
    #[must_use]
    pub const fn grants_access(&self) -> bool {
        matches!(self, Self::Joined(_) | Self::Promoted(_))
    }
}

/// Result of one toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    /// User who pressed.
    pub user: UserId,
    /// Role toggled.
    pub role: String,
    /// Whether the role was added or removed.
    pub action: RoleAction,
    /// Placement before the toggle.
    pub before: Placement,
    /// Placement after the toggle.
    pub after: Placement,
    /// Accepted-list changes, in the order they happened.
    pub membership: Vec<MembershipChange>,
}

/// Mutates registration lists under capacity and FIFO-promotion rules.
#[derive(Clone)]
pub struct SignupEngine {
    store: Arc<EventStore>,
    locks: Arc<EventLocks>,
    collaborator: SharedCollaborator,
    clock: SharedClock,
}

impl SignupEngine {
    /// Engine over a store, serialized through `locks`.
    pub fn new(
        store: Arc<EventStore>,
        locks: Arc<EventLocks>,
        collaborator: SharedCollaborator,
        clock: SharedClock,
    ) -> Self {
        Self {
            store,
            locks,
            collaborator,
            clock,
        }
    }

    /// Toggle `role` for `user` on a stored event.
    ///
    /// The read-modify-write and the membership calls that follow run under
    /// the event's lock, so concurrent toggles for one event queue up.
    pub async fn toggle(
        &self,
        id: EventId,
        user: &UserId,
        role: &str,
    ) -> Result<(Event, ToggleOutcome), RollcallError> {
        let guard = self.locks.lock(id).await;
        let now = self.clock.now();
        let (event, outcome) = match self
            .store
            .update(id, |event| Self::apply(event, user, role, now))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                drop(guard);
                if e.is_not_found() {
                    self.locks.release(id);
                }
                return Err(e);
            }
        };

        tracing::info!(
            event = %id,
            user = %user,
            role,
            action = ?outcome.action,
            placement = ?outcome.after,
            accepted = event.signups.len(),
            waitlisted = event.waitlist.len(),
            "role toggled"
        );

        if let Some(thread) = &event.thread_id {
            self.sync_membership(id, thread, &outcome.membership).await;
        }
        Ok((event, outcome))
    }

    async fn sync_membership(&self, id: EventId, thread: &ThreadRef, changes: &[MembershipChange]) {
        for change in changes {
            let user = change.user();
            let result = if change.grants_access() {
                self.collaborator.add_member(thread, user).await
            } else {
                self.collaborator.remove_member(thread, user).await
            };
            if let Err(e) = result {
                tracing::warn!(event = %id, user = %user, ?change, "membership update failed: {e}");
            }
        }
    }

    /// Pure toggle transition on an event.
    ///
    /// - no signup: join with `{role}`, accepted if a seat is free, else
    ///   appended to the waitlist
    /// - signup holds `role`: drop it; dropping the last role removes the
    ///   signup, and an accepted removal promotes the waitlist head
    /// - signup lacks `role`: add it, wherever the signup sits
    pub fn apply(
        event: &mut Event,
        user: &UserId,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<ToggleOutcome, RollcallError> {
        if !event.offers_role(role) {
            return Err(RollcallError::UnknownRole {
                event: event.id,
                role: role.to_owned(),
            });
        }

        let before = event.placement_of(user);
        let mut membership = Vec::new();
        let action = match before {
            Placement::Absent => {
                let signup = Signup::new(user.clone(), role, now);
                if event.is_full() {
                    event.waitlist.push(signup);
                } else {
                    event.signups.push(signup);
                    membership.push(MembershipChange::Joined(user.clone()));
                }
                RoleAction::Added
            }
            Placement::Accepted | Placement::Waitlisted => {
                let list = if before == Placement::Accepted {
                    &mut event.signups
                } else {
                    &mut event.waitlist
                };
                let idx = list
                    .iter()
                    .position(|s| &s.user_id == user)
                    .ok_or_else(|| RollcallError::EventNotFound(event.id))?;
                let signup = &mut list[idx];
                if let Some(pos) = signup.roles.iter().position(|r| r == role) {
                    signup.roles.remove(pos);
                    if signup.roles.is_empty() {
                        list.remove(idx);
                        if before == Placement::Accepted {
                            membership.push(MembershipChange::Left(user.clone()));
                            if let Some(promoted) = Self::promote(event) {
                                membership.push(MembershipChange::Promoted(promoted));
                            }
                        }
                    }
                    RoleAction::Removed
                } else {
                    signup.roles.push(role.to_owned());
                    RoleAction::Added
                }
            }
        };

        Ok(ToggleOutcome {
            user: user.clone(),
            role: role.to_owned(),
            action,
            before,
            after: event.placement_of(user),
            membership,
        })
    }

    /// Move the earliest waitlisted signup into a free seat, keeping its
    /// original join instant.
    fn promote(event: &mut Event) -> Option<UserId> {
        if event.is_full() || event.waitlist.is_empty() {
            return None;
        }
        let head = event
            .waitlist
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.joined_at)
            .map(|(i, _)| i)?;
        let promoted = event.waitlist.remove(head);
        let user = promoted.user_id.clone();
        event.signups.push(promoted);
        Some(user)
    }
}
