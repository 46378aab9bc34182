//! Incremental change detection for build tasks.
//!
//! Compares a task's current execution record against the one recorded for its
//! previous run and explains, in priority order and with a bounded number of
//! messages, why the task is out of date. Detection failures never break the
//! build: they degrade to a synthetic "out of date" change.
//!
//! The building blocks are [`TaskStateChanges`] sources, one per concern, and
//! two decorators ([`CachingTaskStateChanges`], [`ErrorHandlingTaskStateChanges`])
//! composed by [`SummaryTaskStateChanges`]. [`TaskUpToDateState`] assembles
//! them into the views a scheduler needs.

#![warn(missing_docs)]

pub mod caching;
pub mod change;
pub mod error;
pub mod error_handling;
pub mod history;
pub mod record;
pub mod snapshot;
pub mod snapshotter;
pub mod source;
pub mod sources;
pub mod state;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support;

pub use caching::CachingTaskStateChanges;
pub use change::{ChangeClass, ChangeMode, TaskStateChange};
pub use error::{DetectionError, HistoryError};
pub use error_handling::ErrorHandlingTaskStateChanges;
pub use history::HistoryStore;
pub use record::{ExecutionRecord, ImplementationSnapshot, PropertySnapshot, TaskIdentity};
pub use snapshot::{
    FileChange, FileChangeKind, FileCollectionSnapshot, FileKind, FileSnapshot,
    NormalizationStrategy, ValueSnapshot,
};
pub use snapshotter::{FileSnapshotter, FsSnapshotter};
pub use source::{ChangeIter, TaskStateChanges};
pub use state::{StateContext, TaskUpToDateState, MAX_OUT_OF_DATE_MESSAGES};
pub use summary::SummaryTaskStateChanges;
