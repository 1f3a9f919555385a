//! Registration engine, lifecycle scheduling and persistence.

pub mod audit;
pub mod collaborator;
pub mod error;
pub mod event;
pub mod locks;
pub mod persistence;
pub mod preview;
pub mod scheduler;
pub mod service;
pub mod signup;
pub mod spawn;
pub mod store;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditLog, AuditSink, InMemoryAuditSink,
    SharedAuditSink,
};
pub use collaborator::{Collaborator, SharedCollaborator};
pub use error::{AppResult, RollcallError};
pub use event::{merge_roles, Event, EventDraft, Origin, Placement, PublishedRefs, Signup};
pub use locks::{EventGuard, EventLocks};
pub use persistence::{Persister, SharedBackend, Snapshot, SnapshotBackend};
pub use preview::{Preview, PreviewManager};
pub use scheduler::{
    reminder_text, BootAction, CleanupSchedule, RestoreReport, RestoredEvent, Scheduler, TaskKind,
};
pub use service::Coordinator;
pub use signup::{MembershipChange, RoleAction, SignupEngine, ToggleOutcome};
pub use spawn::Spawn;
pub use store::EventStore;
