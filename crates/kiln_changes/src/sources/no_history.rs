use std::iter;

use crate::change::{ChangeMode, TaskStateChange};
use crate::record::ExecutionRecord;
use crate::source::{ChangeIter, TaskStateChanges};

/// Reports a single change when the task has never run before.
#[derive(Debug, Clone, Copy)]
pub struct NoHistoryTaskStateChanges<'a> {
    previous: Option<&'a ExecutionRecord>,
}

impl<'a> NoHistoryTaskStateChanges<'a> {
    /// Creates the source.
    pub fn new(previous: Option<&'a ExecutionRecord>) -> Self {
        Self { previous }
    }
}

impl TaskStateChanges for NoHistoryTaskStateChanges<'_> {
    fn changes(&self, _mode: ChangeMode) -> ChangeIter<'_> {
        match self.previous {
            Some(_) => Box::new(iter::empty()),
            None => Box::new(iter::once(Ok(TaskStateChange::modification(
                "No history is available.",
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn reports_once_without_history() {
        let source = NoHistoryTaskStateChanges::new(None);
        for mode in [ChangeMode::ExcludingAdded, ChangeMode::IncludingAdded] {
            let changes = source.collect_changes(mode).unwrap();
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].message(), "No history is available.");
            assert!(!changes[0].is_addition());
        }
    }

    #[test]
    fn silent_with_history() {
        let previous = record();
        let source = NoHistoryTaskStateChanges::new(Some(&previous));
        assert!(source
            .collect_changes(ChangeMode::IncludingAdded)
            .unwrap()
            .is_empty());
    }
}
