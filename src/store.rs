//! Durable per-document progress, read wholesale at run start and rewritten
//! wholesale after every document.
//!
//! The file is small (one entry per document) and the write cadence is one
//! per document, so the whole-file-rewrite strategy is deliberate: last
//! writer wins, no locking, no temp-file dance. Single operator, single
//! process.

use crate::error::TranscribeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Completion metadata for one finished document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedEntry {
    pub timestamp: DateTime<Utc>,
    /// Pages actually processed (after range filtering), not the full count.
    pub pages: usize,
    /// Model-registry key the document was transcribed with.
    pub model: String,
}

/// One document-level failure, appended and never pruned automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub file: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// The whole persisted progress state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Filename → completion metadata. A filename present here is skipped
    /// on resume regardless of which pages the entry covered.
    pub completed: BTreeMap<String, CompletedEntry>,
    pub failed: Vec<FailureRecord>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Handle to the progress file.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the persisted state.
    ///
    /// A missing file yields a fresh empty state. A file that exists but
    /// does not parse is fatal — see
    /// [`TranscribeError::ProgressCorrupt`] for why there is no silent
    /// fallback.
    pub fn load(&self) -> Result<ProgressState, TranscribeError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No progress file at {}, starting fresh", self.path.display());
                return Ok(ProgressState::default());
            }
            Err(e) => {
                return Err(TranscribeError::ProgressIo {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|e| TranscribeError::ProgressCorrupt {
            path: self.path.clone(),
            detail: e.to_string(),
        })
    }

    /// Stamp `last_updated` and rewrite the whole file.
    pub fn save(&self, state: &mut ProgressState) -> Result<(), TranscribeError> {
        state.last_updated = Some(Utc::now());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| TranscribeError::ProgressIo {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| TranscribeError::Internal(format!("Progress serialisation failed: {e}")))?;
        fs::write(&self.path, json).map_err(|e| TranscribeError::ProgressIo {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(
            "Progress saved: {} completed, {} failed",
            state.completed.len(),
            state.failed.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));
        let state = store.load().unwrap();
        assert!(state.completed.is_empty());
        assert!(state.failed.is_empty());
        assert!(state.last_updated.is_none());
    }

    #[test]
    fn save_then_load_round_trips_and_stamps_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));

        let mut state = ProgressState::default();
        state.completed.insert(
            "119.pdf".into(),
            CompletedEntry {
                timestamp: Utc::now(),
                pages: 42,
                model: "gemini-flash".into(),
            },
        );
        state.failed.push(FailureRecord {
            file: "7.pdf".into(),
            error: "corrupt xref table".into(),
            timestamp: Utc::now(),
        });

        store.save(&mut state).unwrap();
        assert!(state.last_updated.is_some());

        let back = store.load().unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn save_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));

        let mut state = ProgressState::default();
        state.completed.insert(
            "a.pdf".into(),
            CompletedEntry {
                timestamp: Utc::now(),
                pages: 1,
                model: "gemini-flash".into(),
            },
        );
        store.save(&mut state).unwrap();

        // Dropping the entry and saving again must not leave it behind.
        state.completed.clear();
        store.save(&mut state).unwrap();
        assert!(store.load().unwrap().completed.is_empty());
    }

    #[test]
    fn malformed_file_is_a_fatal_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let err = ProgressStore::new(&path).load().unwrap_err();
        assert!(matches!(err, TranscribeError::ProgressCorrupt { .. }));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("nested/output/progress.json"));
        store.save(&mut ProgressState::default()).unwrap();
        assert!(store.path().exists());
    }
}
