use crate::change::{ChangeMode, TaskStateChange};
use crate::record::ExecutionRecord;
use crate::source::{ChangeIter, TaskStateChanges};

/// Reports changes to the task's implementation or its actions.
///
/// Emits at most one change for the task type and one for the actions.
#[derive(Debug, Clone, Copy)]
pub struct TaskTypeTaskStateChanges<'a> {
    task_path: &'a str,
    previous: Option<&'a ExecutionRecord>,
    current: &'a ExecutionRecord,
}

impl<'a> TaskTypeTaskStateChanges<'a> {
    /// Creates the source.
    pub fn new(
        task_path: &'a str,
        previous: Option<&'a ExecutionRecord>,
        current: &'a ExecutionRecord,
    ) -> Self {
        Self {
            task_path,
            previous,
            current,
        }
    }

    /// Equal combined hashes settle the comparison unless some component is
    /// unknown, since unknown components hash to the same marker.
    fn identity_unchanged(&self, previous: &ExecutionRecord) -> bool {
        let current = &self.current.identity;
        let any_unknown = std::iter::once(&current.task_type)
            .chain(&current.actions)
            .any(|implementation| implementation.is_unknown());
        !any_unknown && previous.identity.hash() == current.hash()
    }

    fn type_change(&self, previous: &ExecutionRecord) -> Option<TaskStateChange> {
        let before = &previous.identity.task_type;
        let now = &self.current.identity.task_type;
        let path = self.task_path;
        if before.type_name != now.type_name {
            Some(TaskStateChange::modification(format!(
                "Task '{path}' has changed type from '{}' to '{}'.",
                before.type_name, now.type_name
            )))
        } else if now.is_unknown() {
            Some(TaskStateChange::modification(format!(
                "Task '{path}' was loaded with an unknown implementation."
            )))
        } else if before.implementation_hash != now.implementation_hash {
            Some(TaskStateChange::modification(format!(
                "Task '{path}' implementation has changed."
            )))
        } else {
            None
        }
    }

    fn action_change(&self, previous: &ExecutionRecord) -> Option<TaskStateChange> {
        let now = &self.current.identity.actions;
        let path = self.task_path;
        if now.iter().any(|action| action.is_unknown()) {
            Some(TaskStateChange::modification(format!(
                "Task '{path}' has an action with an unknown implementation."
            )))
        } else if previous.identity.actions != *now {
            Some(TaskStateChange::modification(format!(
                "Task '{path}' has changed actions."
            )))
        } else {
            None
        }
    }
}

impl TaskStateChanges for TaskTypeTaskStateChanges<'_> {
    fn changes(&self, _mode: ChangeMode) -> ChangeIter<'_> {
        let Some(previous) = self.previous else {
            return Box::new(std::iter::empty());
        };
        if self.identity_unchanged(previous) {
            return Box::new(std::iter::empty());
        }
        let changes = [self.type_change(previous), self.action_change(previous)];
        Box::new(changes.into_iter().flatten().map(Ok))
    }
}
