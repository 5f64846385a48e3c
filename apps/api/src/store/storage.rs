//! Durable storage for the store's state.
//!
//! The whole state lives under one named key and is rewritten on every
//! write. The blob keeps the `{"state": .., "version": ..}` envelope used by
//! browser builds of the editor, so an exported local-storage entry can be
//! dropped into the data directory as-is.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Resume;

pub const STATE_VERSION: u32 = 0;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored state under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The draft and the saved collection as they are written to storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// `None` when draft persistence is disabled.
    pub resume_data: Option<Resume>,
    pub resumes: Vec<Resume>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub state: StoreSnapshot,
    pub version: u32,
}

impl PersistedState {
    pub fn new(state: StoreSnapshot) -> Self {
        Self {
            state,
            version: STATE_VERSION,
        }
    }
}

/// A single-entry key-value store holding the serialized state.
pub trait ResumeStorage: Send + Sync {
    /// Name of the entry this storage reads and writes.
    fn key(&self) -> &str;

    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<PersistedState>, StorageError>;

    fn store(&self, state: &PersistedState) -> Result<(), StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// File-backed storage
// ────────────────────────────────────────────────────────────────────────────

/// Stores the state as `<dir>/<key>.json`.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a crash mid-write leaves the previous state readable.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    key: String,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ResumeStorage for FileStorage {
    fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let path = self.path();
        if !path.exists() {
            info!("No stored state at {}, starting empty", path.display());
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(io_error(&path))?;
        let state = serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            key: self.key.clone(),
            source,
        })?;

        info!("Loaded stored state from {}", path.display());
        Ok(Some(state))
    }

    fn store(&self, state: &PersistedState) -> Result<(), StorageError> {
        let path = self.path();
        std::fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let contents = serde_json::to_vec(state)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_error(&self.dir))?;
        tmp.write_all(&contents).map_err(io_error(tmp.path()))?;
        tmp.as_file().sync_all().map_err(io_error(&path))?;
        tmp.persist(&path).map_err(|e| io_error(&path)(e.error))?;

        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory storage
// ────────────────────────────────────────────────────────────────────────────

/// Keeps the serialized blob in memory. Nothing survives a restart.
#[derive(Debug)]
pub struct MemoryStorage {
    key: String,
    blob: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            blob: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub fn raw(&self) -> Option<String> {
        self.blob.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ResumeStorage for MemoryStorage {
    fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let blob = self.blob.lock().unwrap_or_else(|e| e.into_inner());
        blob.as_deref()
            .map(|contents| serde_json::from_str(contents))
            .transpose()
            .map_err(|source| StorageError::Corrupt {
                key: self.key.clone(),
                source,
            })
    }

    fn store(&self, state: &PersistedState) -> Result<(), StorageError> {
        let contents = serde_json::to_string(state)?;
        *self.blob.lock().unwrap_or_else(|e| e.into_inner()) = Some(contents);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Skill;

    fn sample_state() -> PersistedState {
        let mut draft = Resume::new();
        draft.basics.name = "Ada".to_string();
        let mut saved = Resume::new();
        saved.skills.push(Skill {
            name: "Rust".to_string(),
            ..Default::default()
        });
        PersistedState::new(StoreSnapshot {
            resume_data: Some(draft),
            resumes: vec![saved],
        })
    }

    #[test]
    fn test_file_storage_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "resume-storage");
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"), "resume-storage");
        let state = sample_state();

        storage.store(&state).unwrap();
        assert!(storage.path().ends_with("nested/resume-storage.json"));

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_file_storage_overwrites_whole_entry() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "resume-storage");
        storage.store(&sample_state()).unwrap();
        storage.store(&PersistedState::default()).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert!(loaded.state.resumes.is_empty());
        assert!(loaded.state.resume_data.is_none());
    }

    #[test]
    fn test_file_storage_reports_corrupt_blob() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "resume-storage");
        std::fs::write(storage.path(), "{ not json").unwrap();

        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "resume-storage"));
    }

    #[test]
    fn test_file_storage_write_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let storage = FileStorage::new(&blocker, "resume-storage");

        let err = storage.store(&sample_state()).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn test_loads_browser_envelope_without_item_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "resume-storage");
        std::fs::write(
            storage.path(),
            r#"{"state":{"resumeData":{"id":"6f1c2a4e-8d3b-4c7a-9e21-3b5d7f9a1c2e","createdAt":1700000000000,"updatedAt":1700000000000,"basics":{"name":"Ada"},"skills":[{"name":"Rust","level":"Expert","keywords":[]}]},"resumes":[]},"version":0}"#,
        )
        .unwrap();

        let loaded = storage.load().unwrap().unwrap();
        let draft = loaded.state.resume_data.unwrap();
        assert_eq!(draft.basics.name, "Ada");
        assert_eq!(draft.skills.get_at(0).unwrap().level, "Expert");
        assert_eq!(draft.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new("resume-storage");
        assert!(storage.load().unwrap().is_none());

        let state = sample_state();
        storage.store(&state).unwrap();
        assert_eq!(storage.load().unwrap().unwrap(), state);
        assert!(storage.raw().unwrap().starts_with("{\"state\":"));
    }
}
