//! Infrastructure adapters for snapshot storage and the platform seam.

pub mod collaborator;
pub mod snapshot;

pub use collaborator::RecordingCollaborator;
pub use snapshot::{InMemorySnapshot, JsonFileSnapshot};
