//! Snapshot persistence.
//!
//! The store hands every post-mutation snapshot to a [`Persister`]. Two
//! contracts are available:
//!
//! - **write-through**: the mutating call awaits the write.
//! - **write-behind**: a background task writes the newest pending snapshot;
//!   [`Persister::flush`] waits until everything issued so far has settled.
//!
//! In both modes a write is retried with exponential backoff up to
//! `max_attempts`; the final failure is logged and reported by `flush`, and
//! the in-memory state stays authoritative.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};

use crate::config::{PersistenceMode, RetryConfig};
use crate::core::{Event, RollcallError, Spawn};

/// Durable home of the full event snapshot.
pub trait SnapshotBackend: Send + Sync + 'static {
    /// Read the last snapshot. A missing snapshot is an empty one.
    fn load(&self) -> Result<Vec<Event>, RollcallError>;
    /// Replace the snapshot with `events`.
    fn save(&self, events: &[Event]) -> Result<(), RollcallError>;
}

/// Shared backend handle.
pub type SharedBackend = Arc<dyn SnapshotBackend>;

/// Full copy of the store taken right after a mutation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Monotonic mutation counter.
    pub generation: u64,
    /// Events ordered by start time then id.
    pub events: Arc<Vec<Event>>,
}

#[derive(Debug, Clone, Default)]
struct Settled {
    generation: u64,
    error: Option<String>,
}

enum Mode {
    Through {
        backend: SharedBackend,
        written: AsyncMutex<u64>,
        settled: Mutex<Settled>,
    },
    Behind {
        tx: mpsc::UnboundedSender<Snapshot>,
        settled: watch::Receiver<Settled>,
    },
}

/// Writes snapshots according to the configured durability contract.
pub struct Persister {
    mode: Mode,
    retry: RetryConfig,
    issued: AtomicU64,
}

impl Persister {
    /// Build a persister for `mode`, spawning the write-behind worker if needed.
    pub fn new<S: Spawn>(
        mode: PersistenceMode,
        backend: SharedBackend,
        retry: RetryConfig,
        spawner: &S,
    ) -> Self {
        match mode {
            PersistenceMode::WriteThrough => Self::write_through(backend, retry),
            PersistenceMode::WriteBehind => Self::write_behind(backend, retry, spawner),
        }
    }

    /// Persister whose writes complete before the mutating call returns.
    #[must_use]
    pub fn write_through(backend: SharedBackend, retry: RetryConfig) -> Self {
        Self {
            mode: Mode::Through {
                backend,
                written: AsyncMutex::new(0),
                settled: Mutex::new(Settled::default()),
            },
            retry,
            issued: AtomicU64::new(0),
        }
    }

    /// Persister with a background writer coalescing to the newest snapshot.
    pub fn write_behind<S: Spawn>(backend: SharedBackend, retry: RetryConfig, spawner: &S) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Snapshot>();
        let (settled_tx, settled_rx) = watch::channel(Settled::default());
        let worker_retry = retry.clone();

        spawner.spawn(async move {
            let mut written = 0;
            while let Some(mut snapshot) = rx.recv().await {
                while let Ok(newer) = rx.try_recv() {
                    if newer.generation > snapshot.generation {
                        snapshot = newer;
                    }
                }
                if snapshot.generation <= written {
                    continue;
                }
                let result = write_with_retry(&backend, &snapshot, &worker_retry).await;
                written = snapshot.generation;
                settled_tx.send_replace(Settled {
                    generation: written,
                    error: result.err().map(|e| e.to_string()),
                });
            }
            tracing::debug!("snapshot writer stopped");
        });

        Self {
            mode: Mode::Behind {
                tx,
                settled: settled_rx,
            },
            retry,
            issued: AtomicU64::new(0),
        }
    }

    /// Durability contract in effect.
    #[must_use]
    pub const fn mode(&self) -> PersistenceMode {
        match self.mode {
            Mode::Through { .. } => PersistenceMode::WriteThrough,
            Mode::Behind { .. } => PersistenceMode::WriteBehind,
        }
    }

    /// Persist a snapshot. Never fails the caller; failures are logged.
    pub async fn persist(&self, snapshot: Snapshot) {
        self.issued.fetch_max(snapshot.generation, Ordering::AcqRel);
        match &self.mode {
            Mode::Through {
                backend,
                written,
                settled,
            } => {
                let mut written = written.lock().await;
                if snapshot.generation <= *written {
                    return;
                }
                let result = write_with_retry(backend, &snapshot, &self.retry).await;
                *written = snapshot.generation;
                *settled.lock() = Settled {
                    generation: snapshot.generation,
                    error: result.err().map(|e| e.to_string()),
                };
            }
            Mode::Behind { tx, .. } => {
                let generation = snapshot.generation;
                if tx.send(snapshot).is_err() {
                    tracing::error!(generation, "snapshot writer is gone; snapshot dropped");
                }
            }
        }
    }

    /// Wait until every snapshot issued so far has settled and report the
    /// outcome of the newest write.
    pub async fn flush(&self) -> Result<(), RollcallError> {
        let target = self.issued.load(Ordering::Acquire);
        let settled = match &self.mode {
            Mode::Through {
                written, settled, ..
            } => {
                // a write in progress holds `written` until it has settled
                let _written = written.lock().await;
                settled.lock().clone()
            }
            Mode::Behind { settled, .. } => {
                let mut rx = settled.clone();
                let seen = rx
                    .wait_for(|s| s.generation >= target)
                    .await
                    .map_err(|_| RollcallError::Persistence("snapshot writer is gone".into()))?;
                seen.clone()
            }
        };
        settled.error.map_or(Ok(()), |e| Err(RollcallError::Persistence(e)))
    }
}

/// Run the synchronous backend write on the blocking pool.
async fn save_blocking(backend: &SharedBackend, events: &Arc<Vec<Event>>) -> Result<(), RollcallError> {
    let backend = Arc::clone(backend);
    let events = Arc::clone(events);
    tokio::task::spawn_blocking(move || backend.save(&events))
        .await
        .map_err(|e| RollcallError::Persistence(format!("snapshot write task failed: {e}")))?
}

async fn write_with_retry(
    backend: &SharedBackend,
    snapshot: &Snapshot,
    retry: &RetryConfig,
) -> Result<(), RollcallError> {
    let mut attempt = 1;
    loop {
        match save_blocking(backend, &snapshot.events).await {
            Ok(()) => {
                tracing::debug!(
                    generation = snapshot.generation,
                    events = snapshot.events.len(),
                    "snapshot saved"
                );
                return Ok(());
            }
            Err(e) if attempt < retry.max_attempts => {
                let delay = retry.backoff(attempt);
                tracing::warn!(
                    generation = snapshot.generation,
                    attempt,
                    ?delay,
                    "snapshot write failed, retrying: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    generation = snapshot.generation,
                    attempt,
                    "snapshot write failed, giving up: {e}"
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::{self, ThreadId};

    #[derive(Default)]
    struct ThreadRecorder {
        seen: Mutex<Vec<ThreadId>>,
    }

    impl SnapshotBackend for ThreadRecorder {
        fn load(&self) -> Result<Vec<Event>, RollcallError> {
            Ok(Vec::new())
        }

        fn save(&self, _events: &[Event]) -> Result<(), RollcallError> {
            self.seen.lock().push(thread::current().id());
            Ok(())
        }
    }

    #[tokio::test]
    async fn backend_writes_run_off_the_runtime_thread() {
        let recorder = Arc::new(ThreadRecorder::default());
        let backend: SharedBackend = recorder.clone();
        let persister = Persister::write_through(backend, RetryConfig::default());

        persister
            .persist(Snapshot {
                generation: 1,
                events: Arc::new(Vec::new()),
            })
            .await;
        persister.flush().await.unwrap();

        let seen = recorder.seen.lock().clone();
        assert_eq!(seen.len(), 1);
        assert_ne!(seen[0], thread::current().id());
    }
}
