use crate::change::ChangeMode;
use crate::record::ExecutionRecord;
use crate::snapshot::NormalizationStrategy;
use crate::source::{ChangeIter, TaskStateChanges};
use crate::sources::files::{property_changes, FileRole};

/// Reports differences between the previous and current output files.
///
/// Newly appearing outputs are [`Addition`](crate::ChangeClass::Addition)s and
/// are only enumerated in [`ChangeMode::IncludingAdded`].
#[derive(Debug, Clone, Copy)]
pub struct OutputFilesTaskStateChanges<'a> {
    previous: Option<&'a ExecutionRecord>,
    current: &'a ExecutionRecord,
    normalization: &'a NormalizationStrategy,
}

impl<'a> OutputFilesTaskStateChanges<'a> {
    /// Creates the source.
    pub fn new(
        previous: Option<&'a ExecutionRecord>,
        current: &'a ExecutionRecord,
        normalization: &'a NormalizationStrategy,
    ) -> Self {
        Self {
            previous,
            current,
            normalization,
        }
    }
}

impl TaskStateChanges for OutputFilesTaskStateChanges<'_> {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        let Some(previous) = self.previous else {
            return Box::new(std::iter::empty());
        };
        property_changes(
            FileRole::Output,
            &previous.output_files,
            &self.current.output_files,
            self.normalization,
            mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{FileCollectionSnapshot, FileSnapshot};
    use crate::test_support::record;

    fn outputs(files: &[(&str, &str)]) -> FileCollectionSnapshot {
        files
            .iter()
            .map(|(path, content)| (*path, FileSnapshot::file(content.as_bytes())))
            .collect()
    }

    #[test]
    fn pure_addition_only_visible_when_including_added() {
        let norm = NormalizationStrategy::absolute();
        let previous = record().with_output_files("out", outputs(&[("a.txt", "A")]));
        let current =
            record().with_output_files("out", outputs(&[("a.txt", "A"), ("b.txt", "B")]));
        let source = OutputFilesTaskStateChanges::new(Some(&previous), &current, &norm);

        assert!(source
            .collect_changes(ChangeMode::ExcludingAdded)
            .unwrap()
            .is_empty());
        let added = source.collect_changes(ChangeMode::IncludingAdded).unwrap();
        assert_eq!(added.len(), 1);
        assert!(added[0].is_addition());
        assert_eq!(
            added[0].message(),
            "Output property 'out' file b.txt has been added."
        );
    }

    #[test]
    fn removed_and_changed_outputs_reported() {
        let norm = NormalizationStrategy::absolute();
        let previous =
            record().with_output_files("out", outputs(&[("a.txt", "A"), ("b.txt", "B")]));
        let current = record().with_output_files("out", outputs(&[("a.txt", "A2")]));
        let messages: Vec<_> = OutputFilesTaskStateChanges::new(Some(&previous), &current, &norm)
            .collect_changes(ChangeMode::ExcludingAdded)
            .unwrap()
            .into_iter()
            .map(|c| c.message().to_string())
            .collect();
        assert_eq!(
            messages,
            vec![
                "Output property 'out' file a.txt has changed.",
                "Output property 'out' file b.txt has been removed.",
            ]
        );
    }

    #[test]
    fn property_level_changes() {
        let norm = NormalizationStrategy::absolute();
        let previous = record().with_output_files("logs", outputs(&[("log.txt", "L")]));
        let current = record().with_output_files("classes", outputs(&[("A.class", "C")]));
        let source = OutputFilesTaskStateChanges::new(Some(&previous), &current, &norm);

        let excluding = source.collect_changes(ChangeMode::ExcludingAdded).unwrap();
        assert_eq!(excluding.len(), 1);
        assert_eq!(
            excluding[0].message(),
            "Output property 'logs' has been removed."
        );

        let including = source.collect_changes(ChangeMode::IncludingAdded).unwrap();
        assert_eq!(including.len(), 2);
        assert_eq!(
            including[0].message(),
            "Output property 'classes' has been added."
        );
        assert!(including[0].is_addition());
    }

    #[test]
    fn silent_without_history() {
        let norm = NormalizationStrategy::absolute();
        let current = record().with_output_files("out", outputs(&[("a.txt", "A")]));
        let source = OutputFilesTaskStateChanges::new(None, &current, &norm);
        assert!(source
            .collect_changes(ChangeMode::IncludingAdded)
            .unwrap()
            .is_empty());
    }
}
