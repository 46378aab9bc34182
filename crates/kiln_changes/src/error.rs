//! Error types for change detection and history persistence.

use std::path::PathBuf;
use std::sync::Arc;

/// A failure while comparing a task's previous and current state.
///
/// These never reach the scheduler as build failures: the
/// [`ErrorHandlingTaskStateChanges`](crate::ErrorHandlingTaskStateChanges)
/// decorator turns them into a synthetic out-of-date change. The type is
/// `Clone` so a memoized failure can be replayed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectionError {
    /// A file could not be read while capturing a snapshot.
    #[error("I/O error snapshotting {path}: {source}")]
    Io {
        /// The path being snapshotted.
        path: PathBuf,
        /// The underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// A value snapshot recorded as unavailable cannot be compared.
    #[error("snapshot of {subject} is unavailable: {reason}")]
    UnavailableSnapshot {
        /// What the snapshot describes, e.g. `input property 'sources'`.
        subject: String,
        /// Why the value could not be captured.
        reason: String,
    },

    /// Two different files map to the same normalized key.
    #[error("cannot normalize {first} and {second}: both map to '{key}' with different content")]
    AmbiguousNormalization {
        /// The shared normalized key.
        key: String,
        /// The first path mapping to `key`.
        first: PathBuf,
        /// The second path mapping to `key`.
        second: PathBuf,
    },
}

impl DetectionError {
    /// Wraps an I/O error raised while reading `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Errors that can occur while persisting task history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// An I/O error occurred while reading or writing the history file.
    #[error("history I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The history could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
