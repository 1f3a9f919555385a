//! Event and signup data model.
//!
//! An [`Event`] owns two FIFO lists: `signups` (accepted, bounded by
//! `capacity`) and `waitlist` (overflow). The registration invariants are
//! listed on [`Event::check_invariants`]; every mutation through
//! [`SignupEngine`](crate::core::SignupEngine) preserves them.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TemplateConfig;
use crate::core::RollcallError;
use crate::util::ids::{EventId, MessageRef, ThreadRef, UserId};

/// A user's registration against one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    /// Registered user.
    pub user_id: UserId,
    /// Roles held, in the order they were picked. Never empty.
    pub roles: Vec<String>,
    /// Join instant; defines FIFO and promotion order.
    #[serde(alias = "timestamp")]
    pub joined_at: DateTime<Utc>,
}

impl Signup {
    /// New signup holding a single role.
    pub fn new(user_id: UserId, role: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            roles: vec![role.into()],
            joined_at,
        }
    }

    /// Whether the signup holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Where a user currently sits within an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Holds a seat in `signups`.
    Accepted,
    /// Queued in `waitlist`.
    Waitlisted,
    /// Not registered.
    Absent,
}

/// External references backfilled after the event is first published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRefs {
    /// Presentation message.
    pub message: MessageRef,
    /// Discussion thread, if the platform created one.
    pub thread: Option<ThreadRef>,
}

/// Where a draft originated on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Origin {
    /// Channel the event is posted to.
    pub channel_id: String,
    /// Guild owning the channel.
    pub guild_id: String,
    /// Operator who created the event.
    pub author_id: UserId,
    /// Operator display name, if known.
    pub author_name: Option<String>,
}

/// An unconfirmed event, before identity is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Template key.
    pub template: String,
    /// Title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Start instant.
    pub start_time: DateTime<Utc>,
    /// Informational length.
    pub duration_minutes: u32,
    /// Accepted seats.
    pub capacity: u32,
    /// Base roles followed by custom roles, duplicates collapsed.
    pub roles: Vec<String>,
    /// Origination context.
    pub origin: Origin,
}

impl EventDraft {
    /// Build a draft from a template plus operator-supplied custom roles.
    ///
    /// `duration_minutes` falls back to the template default.
    pub fn from_template(
        key: &str,
        template: &TemplateConfig,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        duration_minutes: Option<u32>,
        custom_roles: &[String],
        origin: Origin,
    ) -> Result<Self, RollcallError> {
        let draft = Self {
            template: key.to_owned(),
            title: title.into(),
            description: None,
            start_time,
            duration_minutes: duration_minutes.unwrap_or(template.duration_minutes),
            capacity: template.capacity,
            roles: merge_roles(&template.roles, custom_roles),
            origin,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check structural rules: positive capacity, at least one unique role.
    pub fn validate(&self) -> Result<(), RollcallError> {
        if self.capacity == 0 {
            return Err(RollcallError::InvalidDraft("capacity must be positive".into()));
        }
        if self.roles.is_empty() {
            return Err(RollcallError::InvalidDraft("no roles offered".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.roles.iter().find(|r| !seen.insert(r.as_str())) {
            return Err(RollcallError::InvalidDraft(format!("duplicate role `{dup}`")));
        }
        Ok(())
    }

    /// Stamp identity onto the draft.
    #[must_use]
    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            template: self.template,
            title: self.title,
            description: self.description,
            channel_id: self.origin.channel_id,
            guild_id: self.origin.guild_id,
            creator_id: self.origin.author_id,
            creator_name: self.origin.author_name,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            capacity: self.capacity,
            roles: self.roles,
            signups: Vec::new(),
            waitlist: Vec::new(),
            message_id: None,
            thread_id: None,
        }
    }
}

/// Base roles then custom roles, trimmed, first occurrence wins.
#[must_use]
pub fn merge_roles(base: &[String], custom: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    base.iter()
        .chain(custom)
        .map(|r| r.trim())
        .filter(|r| !r.is_empty() && seen.insert(r.to_owned()))
        .map(str::to_owned)
        .collect()
}

/// A scheduled activity with capacity-bounded registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Durable identity.
    pub id: EventId,
    /// Template key.
    pub template: String,
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Channel the event is posted to.
    pub channel_id: String,
    /// Guild owning the channel.
    pub guild_id: String,
    /// Operator who created the event.
    pub creator_id: UserId,
    /// Operator display name.
    #[serde(default)]
    pub creator_name: Option<String>,
    /// Start instant.
    pub start_time: DateTime<Utc>,
    /// Informational length in minutes.
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    /// Accepted seats.
    pub capacity: u32,
    /// Offered roles.
    pub roles: Vec<String>,
    /// Accepted registrations, FIFO.
    #[serde(default)]
    pub signups: Vec<Signup>,
    /// Overflow registrations, FIFO.
    #[serde(default)]
    pub waitlist: Vec<Signup>,
    /// Presentation message, once published.
    #[serde(default)]
    pub message_id: Option<MessageRef>,
    /// Discussion thread, once published.
    #[serde(default)]
    pub thread_id: Option<ThreadRef>,
}

impl Event {
    /// Instant the reminder is due.
    #[must_use]
    pub fn reminder_at(&self, lead: Duration) -> DateTime<Utc> {
        self.start_time - lead
    }

    /// Instant the event is torn down.
    #[must_use]
    pub fn cleanup_at(&self, grace: Duration) -> DateTime<Utc> {
        self.start_time + grace
    }

    /// Whether every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.signups.len() >= self.capacity as usize
    }

    /// Whether the event offers `role`.
    #[must_use]
    pub fn offers_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Where `user` sits.
    #[must_use]
    pub fn placement_of(&self, user: &UserId) -> Placement {
        if self.signups.iter().any(|s| &s.user_id == user) {
            Placement::Accepted
        } else if self.waitlist.iter().any(|s| &s.user_id == user) {
            Placement::Waitlisted
        } else {
            Placement::Absent
        }
    }

    /// Signup of `user`, accepted or waitlisted.
    #[must_use]
    pub fn signup_of(&self, user: &UserId) -> Option<&Signup> {
        self.signups
            .iter()
            .chain(&self.waitlist)
            .find(|s| &s.user_id == user)
    }

    /// Whether the event has been published.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        self.message_id.is_some()
    }

    /// Verify the registration invariants:
    ///
    /// 1. `signups.len() <= capacity`
    /// 2. a user appears at most once across `signups` and `waitlist`
    /// 3. a non-empty waitlist implies the event is full
    /// 4. every signup holds at least one role, each role at most once
    /// 5. the waitlist is ordered by `joined_at`
    /// 6. every held role is offered by the event
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.signups.len() > self.capacity as usize {
            return Err(format!(
                "{} signups exceed capacity {}",
                self.signups.len(),
                self.capacity
            ));
        }
        let mut users = HashSet::new();
        for signup in self.signups.iter().chain(&self.waitlist) {
            if !users.insert(&signup.user_id) {
                return Err(format!("user {} registered twice", signup.user_id));
            }
            if signup.roles.is_empty() {
                return Err(format!("user {} holds no role", signup.user_id));
            }
            let mut roles = HashSet::new();
            for role in &signup.roles {
                if !roles.insert(role) {
                    return Err(format!("user {} holds `{role}` twice", signup.user_id));
                }
                if !self.offers_role(role) {
                    return Err(format!("user {} holds unoffered role `{role}`", signup.user_id));
                }
            }
        }
        if !self.waitlist.is_empty() && !self.is_full() {
            return Err("waitlist non-empty while seats are free".into());
        }
        if self.waitlist.windows(2).any(|w| w[0].joined_at > w[1].joined_at) {
            return Err("waitlist out of join order".into());
        }
        Ok(())
    }
}
