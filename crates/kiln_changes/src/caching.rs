//! Memoization of a change source's result.

use std::cell::OnceCell;
use std::iter;

use crate::change::{ChangeMode, TaskStateChange};
use crate::error::DetectionError;
use crate::source::{ChangeIter, TaskStateChanges};

/// Drains the wrapped source at most once and replays the result.
///
/// The first query in either mode drains the wrapped source in
/// [`ChangeMode::IncludingAdded`] and stores every change, or the failure that
/// ended the drain. Later queries never touch the wrapped source again;
/// [`ChangeMode::ExcludingAdded`] queries filter additions out of the memo.
pub struct CachingTaskStateChanges<S> {
    inner: S,
    cached: OnceCell<Result<Vec<TaskStateChange>, DetectionError>>,
}

impl<S: TaskStateChanges> CachingTaskStateChanges<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: OnceCell::new(),
        }
    }

    fn cached(&self) -> &Result<Vec<TaskStateChange>, DetectionError> {
        self.cached
            .get_or_init(|| self.inner.changes(ChangeMode::IncludingAdded).collect())
    }
}

impl<S: TaskStateChanges> TaskStateChanges for CachingTaskStateChanges<S> {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        match self.cached() {
            Ok(changes) => Box::new(
                changes
                    .iter()
                    .filter(move |change| mode.includes(change))
                    .cloned()
                    .map(Ok),
            ),
            Err(err) => Box::new(iter::once(Err(err.clone()))),
        }
    }
}
