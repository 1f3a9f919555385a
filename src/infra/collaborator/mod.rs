//! Collaborator backends.

pub mod recording;

pub use recording::{CallKind, CollaboratorCall, RecordingCollaborator};
