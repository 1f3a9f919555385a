//! Runtime adapters and API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{health, restore, toggle, Health, RestoreSummary, ToggleRequest, ToggleResponse};
pub use tokio_spawner::TokioSpawner;
