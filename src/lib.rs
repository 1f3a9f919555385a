//! # Prometheus Rollcall
//!
//! Capacity-bounded sign-up coordination for scheduled activities, with a
//! recoverable timer subsystem for the pre-start reminder and the post-start
//! teardown.
//!
//! ## Core Problem Solved
//!
//! Group activities fill a fixed number of seats from a stream of button
//! presses and then need timed follow-up:
//!
//! - **Capacity**: overflow parks on a FIFO waitlist; a freed seat promotes the
//!   earliest waiter with its original join time.
//! - **Idempotent toggles**: pressing the same role twice returns the user to
//!   "not registered".
//! - **Restarts**: reminders and cleanups are rebuilt from the persisted store;
//!   events whose cleanup deadline passed while down are retired at once.
//! - **Concurrency**: every mutation of one event is serialized, including the
//!   platform calls that follow it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_rollcall::builders::CoordinatorBuilder;
//! use prometheus_rollcall::config::RollcallConfig;
//! use prometheus_rollcall::core::{Origin, PublishedRefs};
//! use prometheus_rollcall::runtime::TokioSpawner;
//!
//! let coordinator = CoordinatorBuilder::new(RollcallConfig::from_env()?)
//!     .with_collaborator(Arc::new(my_platform))
//!     .build(TokioSpawner::current())?;
//! coordinator.restore_on_boot().await;
//!
//! let draft = coordinator.draft("fractal", "T4 dailies", start, None, &[], origin)?;
//! let preview = coordinator.stage_preview(draft);
//! let event = coordinator.confirm_preview(&preview).await?;
//! let event = coordinator.publish(event.id, refs).await?;
//! coordinator.schedule(&event).await;
//!
//! coordinator.toggle_role(event.id, &user, "Healer").await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Registration engine, lifecycle scheduling and persistence.
pub mod core;
/// Configuration models for timing, persistence, and templates.
pub mod config;
/// Builders to construct the coordinator from configuration.
pub mod builders;
/// Infrastructure adapters for snapshot storage and the platform seam.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
