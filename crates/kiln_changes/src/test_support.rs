//! Shared fixtures for unit tests.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use kiln_common::ContentHash;

use crate::error::DetectionError;
use crate::record::{ExecutionRecord, ImplementationSnapshot, TaskIdentity};
use crate::snapshot::{FileCollectionSnapshot, FileSnapshot};
use crate::snapshotter::FileSnapshotter;

/// A successful record for `org.example.Compile` with nothing declared.
pub(crate) fn record() -> ExecutionRecord {
    ExecutionRecord::new(TaskIdentity::new(ImplementationSnapshot::new(
        "org.example.Compile",
        ContentHash::from_bytes(b"v1"),
    )))
}

/// Snapshotter backed by an in-memory file table that counts its calls.
pub(crate) struct MemorySnapshotter {
    files: BTreeMap<PathBuf, FileSnapshot>,
    fail: bool,
    calls: Cell<usize>,
}

impl MemorySnapshotter {
    pub(crate) fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            fail: false,
            calls: Cell::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub(crate) fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(PathBuf::from(path), FileSnapshot::file(content));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl FileSnapshotter for MemorySnapshotter {
    fn snapshot(&self, paths: &[PathBuf]) -> Result<FileCollectionSnapshot, DetectionError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(DetectionError::io(
                paths.first().cloned().unwrap_or_default(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
            ));
        }
        Ok(paths
            .iter()
            .map(|path| {
                let snapshot = self
                    .files
                    .get(path)
                    .copied()
                    .unwrap_or_else(FileSnapshot::missing);
                (path.clone(), snapshot)
            })
            .collect())
    }
}
