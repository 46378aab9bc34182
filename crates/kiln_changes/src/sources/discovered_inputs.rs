use std::cell::RefCell;
use std::iter;
use std::path::PathBuf;

use crate::change::{ChangeMode, TaskStateChange};
use crate::error::DetectionError;
use crate::record::ExecutionRecord;
use crate::snapshot::{FileCollectionSnapshot, NormalizationStrategy};
use crate::snapshotter::FileSnapshotter;
use crate::source::{ChangeIter, TaskStateChanges};
use crate::sources::files::file_change_message;

/// Reports changes to inputs discovered during the previous run, and records
/// the inputs discovered during this one.
///
/// Comparison re-snapshots the previously discovered paths on first pull and
/// diffs them against the recorded snapshot. [`record_new_inputs`] is the only
/// way new state enters the pipeline; the captured snapshot is handed back
/// through [`recorded`] for the caller to store in the current record.
///
/// [`record_new_inputs`]: Self::record_new_inputs
/// [`recorded`]: Self::recorded
pub struct DiscoveredInputsTaskStateChanges<'a> {
    previous: Option<&'a ExecutionRecord>,
    snapshotter: &'a dyn FileSnapshotter,
    normalization: &'a NormalizationStrategy,
    recorded: RefCell<Option<FileCollectionSnapshot>>,
}

impl<'a> DiscoveredInputsTaskStateChanges<'a> {
    /// Creates the source.
    pub fn new(
        previous: Option<&'a ExecutionRecord>,
        snapshotter: &'a dyn FileSnapshotter,
        normalization: &'a NormalizationStrategy,
    ) -> Self {
        Self {
            previous,
            snapshotter,
            normalization,
            recorded: RefCell::new(None),
        }
    }

    /// Snapshots inputs discovered while the task ran, for comparison on the
    /// next build. Replaces anything recorded earlier.
    pub fn record_new_inputs(&self, paths: &[PathBuf]) -> Result<(), DetectionError> {
        let mut sorted = paths.to_vec();
        sorted.sort();
        sorted.dedup();
        let snapshot = self.snapshotter.snapshot(&sorted)?;
        tracing::debug!(count = snapshot.len(), "recorded discovered inputs");
        *self.recorded.borrow_mut() = Some(snapshot);
        Ok(())
    }

    /// The snapshot captured by the last [`record_new_inputs`](Self::record_new_inputs).
    pub fn recorded(&self) -> Option<FileCollectionSnapshot> {
        self.recorded.borrow().clone()
    }
}

impl TaskStateChanges for DiscoveredInputsTaskStateChanges<'_> {
    fn changes(&self, _mode: ChangeMode) -> ChangeIter<'_> {
        let Some(previous) = self.previous else {
            return Box::new(iter::empty());
        };
        if previous.discovered_inputs.is_empty() {
            return Box::new(iter::empty());
        }
        let snapshotter = self.snapshotter;
        let normalization = self.normalization;

        let diff = iter::once_with(move || -> Vec<Result<TaskStateChange, DetectionError>> {
            let recorded = &previous.discovered_inputs;
            match snapshotter.snapshot(&recorded.paths()) {
                Ok(now) => now
                    .changes_since(recorded, normalization, true)
                    .map(|result| {
                        result.map(|change| {
                            TaskStateChange::modification(file_change_message(
                                "Discovered input",
                                &change,
                            ))
                        })
                    })
                    .collect(),
                Err(err) => vec![Err(err)],
            }
        });
        Box::new(diff.flatten())
    }
}
