//! Conversion of detection failures into a conservative out-of-date change.

use crate::change::{ChangeMode, TaskStateChange};
use crate::source::{ChangeIter, TaskStateChanges};

/// Turns a failure in the wrapped source into a single synthetic change.
///
/// Changes before the failure pass through unchanged; the failure itself is
/// logged and replaced by a change stating that the task's state could not be
/// determined. Nothing is pulled after that, and no `Err` item ever escapes.
pub struct ErrorHandlingTaskStateChanges<S> {
    task_path: String,
    inner: S,
}

impl<S: TaskStateChanges> ErrorHandlingTaskStateChanges<S> {
    /// Wraps `inner` for the task at `task_path`.
    pub fn new(task_path: impl Into<String>, inner: S) -> Self {
        Self {
            task_path: task_path.into(),
            inner,
        }
    }
}

impl<S: TaskStateChanges> TaskStateChanges for ErrorHandlingTaskStateChanges<S> {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        let task_path = self.task_path.as_str();
        let mut inner = self.inner.changes(mode);
        let mut failed = false;
        Box::new(std::iter::from_fn(move || {
            if failed {
                return None;
            }
            match inner.next()? {
                Ok(change) => Some(Ok(change)),
                Err(err) => {
                    failed = true;
                    tracing::warn!(
                        task = task_path,
                        error = %err,
                        "could not determine task state, assuming out of date"
                    );
                    Some(Ok(TaskStateChange::modification(format!(
                        "Could not determine up-to-date state of task '{task_path}': {err}; \
                         assuming it is out of date."
                    ))))
                }
            }
        }))
    }
}
