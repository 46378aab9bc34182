use std::iter;

use crate::change::{ChangeMode, TaskStateChange};
use crate::record::ExecutionRecord;
use crate::source::{ChangeIter, TaskStateChanges};

/// Reports a change when the previous run failed.
#[derive(Debug, Clone, Copy)]
pub struct PreviousSuccessTaskStateChanges<'a> {
    previous: Option<&'a ExecutionRecord>,
}

impl<'a> PreviousSuccessTaskStateChanges<'a> {
    /// Creates the source.
    pub fn new(previous: Option<&'a ExecutionRecord>) -> Self {
        Self { previous }
    }
}

impl TaskStateChanges for PreviousSuccessTaskStateChanges<'_> {
    fn changes(&self, _mode: ChangeMode) -> ChangeIter<'_> {
        match self.previous {
            Some(previous) if !previous.successful => Box::new(iter::once(Ok(
                TaskStateChange::modification("Task has failed previously."),
            ))),
            _ => Box::new(iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn reports_previous_failure() {
        let previous = record().with_successful(false);
        let source = PreviousSuccessTaskStateChanges::new(Some(&previous));
        let changes = source.collect_changes(ChangeMode::ExcludingAdded).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].message(), "Task has failed previously.");
    }

    #[test]
    fn silent_after_success_or_without_history() {
        let previous = record();
        let with_history = PreviousSuccessTaskStateChanges::new(Some(&previous));
        let without_history = PreviousSuccessTaskStateChanges::new(None);
        assert!(with_history
            .collect_changes(ChangeMode::IncludingAdded)
            .unwrap()
            .is_empty());
        assert!(without_history
            .collect_changes(ChangeMode::IncludingAdded)
            .unwrap()
            .is_empty());
    }
}
