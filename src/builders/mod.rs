//! Builders to construct the coordinator from configuration.

pub mod coordinator_builder;

pub use coordinator_builder::{backend_from_config, CoordinatorBuilder};
