use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use watch_logging::watch_debug;
use watcher_core::{Snapshot, SnapshotEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A present-but-unreadable snapshot halts startup; silently
    /// discarding history would re-announce every page.
    #[error("snapshot file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// On-disk shape for one title, JSON field names fixed by the snapshot
/// file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    revision: u64,
    status: String,
    #[serde(rename = "liveRevision", default, skip_serializing_if = "Option::is_none")]
    live_revision: Option<u64>,
}

/// Durable storage for the last-seen snapshot: a single JSON object,
/// title to entry, overwritten atomically on every save.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the persisted snapshot. A missing file is a fresh start, not
    /// an error.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                watch_debug!("No snapshot at {:?}, starting fresh", self.path);
                return Ok(Snapshot::new());
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        let persisted: BTreeMap<String, PersistedEntry> =
            serde_json::from_str(&content).map_err(|err| self.corrupt(err.to_string()))?;

        let mut snapshot = Snapshot::new();
        for (title, entry) in persisted {
            let status = entry
                .status
                .parse()
                .map_err(|err| self.corrupt(format!("{title}: {err}")))?;
            snapshot.insert(
                title,
                SnapshotEntry {
                    revision: entry.revision,
                    status,
                    live_revision: entry.live_revision,
                },
            );
        }
        watch_debug!(
            "Loaded snapshot with {} entries from {:?}",
            snapshot.len(),
            self.path
        );
        Ok(snapshot)
    }

    /// Writes the snapshot via temp file plus rename: either the full new
    /// snapshot lands or the old file stays.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let persisted: BTreeMap<&String, PersistedEntry> = snapshot
            .iter()
            .map(|(title, entry)| {
                (
                    title,
                    PersistedEntry {
                        revision: entry.revision,
                        status: entry.status.as_str().to_string(),
                        live_revision: entry.live_revision,
                    },
                )
            })
            .collect();
        let content = serde_json::to_string_pretty(&persisted)
            .map_err(|err| self.corrupt(err.to_string()))?;

        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
