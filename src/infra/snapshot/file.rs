//! JSON file snapshot backend.
//!
//! The whole store is written as one pretty-printed JSON array with RFC 3339
//! timestamps. Writes go to a sibling temp file that is then renamed over the
//! snapshot, so a crash mid-write leaves the previous snapshot intact.

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::core::{Event, RollcallError, SnapshotBackend};

/// Snapshot stored as a JSON file.
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    /// Snapshot at `path`. Parent directories are created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Snapshot location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn backend_err(context: &str, path: &Path, e: impl std::fmt::Display) -> RollcallError {
    RollcallError::Persistence(format!("{context} {}: {e}", path.display()))
}

impl SnapshotBackend for JsonFileSnapshot {
    fn load(&self) -> Result<Vec<Event>, RollcallError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no snapshot found, starting fresh");
                return Ok(Vec::new());
            }
            Err(e) => return Err(backend_err("opening", &self.path, e)),
        };
        serde_json::from_reader(BufReader::new(file)).map_err(|e| backend_err("parsing", &self.path, e))
    }

    fn save(&self, events: &[Event]) -> Result<(), RollcallError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| backend_err("creating", dir, e))?;
        }
        let body = serde_json::to_vec_pretty(events).map_err(|e| backend_err("encoding", &self.path, e))?;
        let temp = self.temp_path();
        let mut file = File::create(&temp).map_err(|e| backend_err("creating", &temp, e))?;
        file.write_all(&body)
            .and_then(|()| file.sync_all())
            .map_err(|e| backend_err("writing", &temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| backend_err("replacing", &self.path, e))?;
        tracing::debug!(path = %self.path.display(), events = events.len(), "snapshot written");
        Ok(())
    }
}
