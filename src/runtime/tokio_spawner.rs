//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};

use crate::core::Spawn;

/// Tokio-based spawner that executes tasks on a tokio runtime.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: Arc<Handle>,
}

impl TokioSpawner {
    /// Create a new `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Spawner for the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Build a multi-threaded runtime and a spawner onto it.
    ///
    /// `worker_threads` defaults to the number of CPUs. The caller owns the
    /// returned runtime; tasks stop when it is dropped.
    pub fn multi_thread(worker_threads: Option<usize>) -> Result<(Runtime, Self), std::io::Error> {
        let workers = worker_threads.unwrap_or_else(num_cpus::get).max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("rollcall-worker")
            .enable_all()
            .build()?;
        let spawner = Self::new(runtime.handle().clone());
        tracing::debug!(workers, "tokio runtime started");
        Ok((runtime, spawner))
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
