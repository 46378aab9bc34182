//! Persistent store of the previous execution record of every task.
//!
//! The store is kept as `history.json` in a state directory. Loading is
//! fail-safe: a missing, unreadable, or incompatible file means no task has
//! history, so every task runs.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::record::ExecutionRecord;

/// Name of the history file within the state directory.
pub const HISTORY_FILE: &str = "history.json";

/// Version of the on-disk layout. Files with any other version are ignored.
const FORMAT_VERSION: u32 = 1;

/// Execution records keyed by task path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStore {
    format_version: u32,
    tasks: BTreeMap<String, ExecutionRecord>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            tasks: BTreeMap::new(),
        }
    }

    /// Loads the store from `state_dir`, returning `None` if the file is
    /// missing, cannot be parsed, or has an incompatible format version.
    pub fn load(state_dir: &Path) -> Option<Self> {
        let path = state_dir.join(HISTORY_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no task history");
                return None;
            }
        };
        let store: Self = match serde_json::from_str(&content) {
            Ok(store) => store,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "discarding unreadable task history");
                return None;
            }
        };
        if store.format_version != FORMAT_VERSION {
            tracing::debug!(
                path = %path.display(),
                version = store.format_version,
                "discarding incompatible task history"
            );
            return None;
        }
        Some(store)
    }

    /// Like [`load`](Self::load), falling back to an empty store.
    pub fn load_or_default(state_dir: &Path) -> Self {
        Self::load(state_dir).unwrap_or_default()
    }

    /// Writes the store to `state_dir`, creating the directory if needed.
    pub fn save(&self, state_dir: &Path) -> Result<(), HistoryError> {
        std::fs::create_dir_all(state_dir).map_err(|e| HistoryError::Io {
            path: state_dir.to_path_buf(),
            source: e,
        })?;
        let path = state_dir.join(HISTORY_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| HistoryError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| HistoryError::Io { path, source: e })
    }

    /// The record of the task's previous run, if any.
    pub fn previous(&self, task_path: &str) -> Option<&ExecutionRecord> {
        self.tasks.get(task_path)
    }

    /// Stores `record` as the task's most recent run, returning the one it
    /// replaces.
    pub fn record(
        &mut self,
        task_path: impl Into<String>,
        record: ExecutionRecord,
    ) -> Option<ExecutionRecord> {
        self.tasks.insert(task_path.into(), record)
    }

    /// Forgets the task's history.
    pub fn remove(&mut self, task_path: &str) -> Option<ExecutionRecord> {
        self.tasks.remove(task_path)
    }

    /// Number of tasks with history.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no task has history.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
