//! Collaborator that records every call instead of talking to a platform.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::{Collaborator, RollcallError};
use crate::util::ids::{MessageRef, ThreadRef, UserId};

/// Kind of collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `notify`
    Notify,
    /// `add_member`
    AddMember,
    /// `remove_member`
    RemoveMember,
    /// `delete_message`
    DeleteMessage,
    /// `delete_thread`
    DeleteThread,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorCall {
    /// Which capability was invoked.
    pub kind: CallKind,
    /// Thread or message reference the call targeted.
    pub target: String,
    /// User id or notification text, when the call carries one.
    pub detail: Option<String>,
    /// Runtime instant of the call.
    pub at: Instant,
}

/// In-memory collaborator for development and tests.
///
/// Calls are recorded even when configured to fail, so tests can assert that
/// a failing call was attempted.
#[derive(Default)]
pub struct RecordingCollaborator {
    calls: Mutex<Vec<CollaboratorCall>>,
    failing: Mutex<HashSet<CallKind>>,
    latency: Mutex<Option<Duration>>,
}

impl RecordingCollaborator {
    /// Collaborator where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make calls of `kind` fail from now on.
    pub fn fail(&self, kind: CallKind) {
        self.failing.lock().insert(kind);
    }

    /// Suspend each call for `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// All calls so far.
    #[must_use]
    pub fn calls(&self) -> Vec<CollaboratorCall> {
        self.calls.lock().clone()
    }

    /// Calls of one kind.
    #[must_use]
    pub fn calls_of(&self, kind: CallKind) -> Vec<CollaboratorCall> {
        self.calls.lock().iter().filter(|c| c.kind == kind).cloned().collect()
    }

    async fn record(
        &self,
        kind: CallKind,
        target: &str,
        detail: Option<&str>,
    ) -> Result<(), RollcallError> {
        self.calls.lock().push(CollaboratorCall {
            kind,
            target: target.to_owned(),
            detail: detail.map(str::to_owned),
            at: Instant::now(),
        });
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.lock().contains(&kind) {
            return Err(RollcallError::Collaborator(format!("{kind:?} on {target} refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl Collaborator for RecordingCollaborator {
    async fn notify(&self, thread: &ThreadRef, text: &str) -> Result<(), RollcallError> {
        self.record(CallKind::Notify, thread.as_str(), Some(text)).await
    }

    async fn add_member(&self, thread: &ThreadRef, user: &UserId) -> Result<(), RollcallError> {
        self.record(CallKind::AddMember, thread.as_str(), Some(user.as_str())).await
    }

    async fn remove_member(
        &self,
        thread: &ThreadRef,
        user: &UserId,
    ) -> Result<(), RollcallError> {
        self.record(CallKind::RemoveMember, thread.as_str(), Some(user.as_str())).await
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), RollcallError> {
        self.record(CallKind::DeleteMessage, message.as_str(), None).await
    }

    async fn delete_thread(&self, thread: &ThreadRef) -> Result<(), RollcallError> {
        self.record(CallKind::DeleteThread, thread.as_str(), None).await
    }
}
