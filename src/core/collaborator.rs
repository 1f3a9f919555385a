//! Outbound seam to the presentation platform.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::RollcallError;
use crate::util::ids::{MessageRef, ThreadRef, UserId};

/// Platform capabilities the core calls into.
///
/// Implemented by the presentation layer. Every call is best-effort from the
/// core's point of view: failures are logged and never roll back a committed
/// registration change or abort a teardown.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_rollcall::core::{Collaborator, RollcallError};
/// use prometheus_rollcall::util::{MessageRef, ThreadRef, UserId};
///
/// struct ChatBridge { /* platform client */ }
///
/// #[async_trait]
/// impl Collaborator for ChatBridge {
///     async fn notify(&self, thread: &ThreadRef, text: &str) -> Result<(), RollcallError> {
///         // post `text` into the thread
///         Ok(())
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait Collaborator: Send + Sync + 'static {
    /// Post a message into a discussion thread.
    async fn notify(&self, thread: &ThreadRef, text: &str) -> Result<(), RollcallError>;

    /// Add a user to a discussion thread.
    async fn add_member(&self, thread: &ThreadRef, user: &UserId) -> Result<(), RollcallError>;

    /// Remove a user from a discussion thread.
    async fn remove_member(&self, thread: &ThreadRef, user: &UserId)
        -> Result<(), RollcallError>;

    /// Delete the presentation message of an event.
    async fn delete_message(&self, message: &MessageRef) -> Result<(), RollcallError>;

    /// Delete the discussion thread of an event.
    async fn delete_thread(&self, thread: &ThreadRef) -> Result<(), RollcallError>;
}

/// Shared collaborator handle.
pub type SharedCollaborator = Arc<dyn Collaborator>;
