use crate::change::{ChangeMode, TaskStateChange};
use crate::record::ExecutionRecord;
use crate::source::{ChangeIter, TaskStateChanges};

/// Reports added, removed, and changed input property values.
///
/// Added and changed properties are reported in the current declaration
/// order, followed by removed properties in their previous declaration order.
#[derive(Debug, Clone, Copy)]
pub struct InputPropertiesTaskStateChanges<'a> {
    task_path: &'a str,
    previous: Option<&'a ExecutionRecord>,
    current: &'a ExecutionRecord,
}

impl<'a> InputPropertiesTaskStateChanges<'a> {
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
}

impl TaskStateChanges for InputPropertiesTaskStateChanges<'_> {
    fn changes(&self, _mode: ChangeMode) -> ChangeIter<'_> {
        let Some(previous) = self.previous else {
            return Box::new(std::iter::empty());
        };
        let current = self.current;
        let task_path = self.task_path;

        let added_or_changed = current.input_properties.iter().filter_map(move |property| {
            let name = &property.name;
            let Some(before) = previous.input_property(name) else {
                return Some(Ok(TaskStateChange::modification(format!(
                    "Input property '{name}' has been added for task '{task_path}'."
                ))));
            };
            match property
                .value
                .is_same_as(before, &format!("input property '{name}'"))
            {
                Ok(true) => None,
                Ok(false) => Some(Ok(TaskStateChange::modification(format!(
                    "Value of input property '{name}' has changed for task '{task_path}'."
                )))),
                Err(err) => Some(Err(err)),
            }
        });

        let removed = previous
            .input_properties
            .iter()
            .filter(move |property| current.input_property(&property.name).is_none())
            .map(move |property| {
                Ok(TaskStateChange::modification(format!(
                    "Input property '{}' has been removed for task '{task_path}'.",
                    property.name
                )))
            });

        Box::new(added_or_changed.chain(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectionError;
    use crate::snapshot::ValueSnapshot;
    use crate::test_support::record;

    fn messages(previous: &ExecutionRecord, current: &ExecutionRecord) -> Vec<String> {
        InputPropertiesTaskStateChanges::new(":compile", Some(previous), current)
            .collect_changes(ChangeMode::ExcludingAdded)
            .unwrap()
            .into_iter()
            .map(|c| c.message().to_string())
            .collect()
    }

    #[test]
    fn identical_properties_are_silent() {
        let previous = record().with_property("level", ValueSnapshot::of_bytes(b"O2"));
        let current = record().with_property("level", ValueSnapshot::of_bytes(b"O2"));
        assert!(messages(&previous, &current).is_empty());
    }

    #[test]
    fn reports_in_declaration_order() {
        let previous = record()
            .with_property("old", ValueSnapshot::of_bytes(b"1"))
            .with_property("level", ValueSnapshot::of_bytes(b"O2"));
        let current = record()
            .with_property("target", ValueSnapshot::of_bytes(b"x86"))
            .with_property("level", ValueSnapshot::of_bytes(b"O3"));
        assert_eq!(
            messages(&previous, &current),
            vec![
                "Input property 'target' has been added for task ':compile'.",
                "Value of input property 'level' has changed for task ':compile'.",
                "Input property 'old' has been removed for task ':compile'.",
            ]
        );
    }

    #[test]
    fn added_property_is_not_an_addition() {
        let previous = record();
        let current = record().with_property("flag", ValueSnapshot::of_bytes(b"on"));
        let changes = InputPropertiesTaskStateChanges::new(":compile", Some(&previous), &current)
            .collect_changes(ChangeMode::ExcludingAdded)
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert!(!changes[0].is_addition());
    }

    #[test]
    fn unavailable_snapshot_yields_error() {
        let previous = record().with_property("flags", ValueSnapshot::of_bytes(b"-g"));
        let current = record().with_property(
            "flags",
            ValueSnapshot::Unavailable {
                reason: "closure cannot be serialized".to_string(),
            },
        );
        let err = InputPropertiesTaskStateChanges::new(":compile", Some(&previous), &current)
            .collect_changes(ChangeMode::ExcludingAdded)
            .unwrap_err();
        assert!(matches!(err, DetectionError::UnavailableSnapshot { .. }));
    }

    #[test]
    fn stops_pulling_after_first_change() {
        let previous = record()
            .with_property("a", ValueSnapshot::of_bytes(b"1"))
            .with_property(
                "b",
                ValueSnapshot::Unavailable {
                    reason: "broken".to_string(),
                },
            );
        let current = record()
            .with_property("a", ValueSnapshot::of_bytes(b"2"))
            .with_property("b", ValueSnapshot::of_bytes(b"2"));
        let source = InputPropertiesTaskStateChanges::new(":compile", Some(&previous), &current);
        let first = source.changes(ChangeMode::ExcludingAdded).next().unwrap();
        assert!(first.is_ok());
    }
}
