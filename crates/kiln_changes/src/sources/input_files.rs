use crate::change::ChangeMode;
use crate::record::ExecutionRecord;
use crate::snapshot::NormalizationStrategy;
use crate::source::{ChangeIter, TaskStateChanges};
use crate::sources::files::{property_changes, FileRole};

/// Reports differences between the previous and current input files.
///
/// Added inputs invalidate the task like any other change, so both query
/// modes report the same changes.
#[derive(Debug, Clone, Copy)]
pub struct InputFilesTaskStateChanges<'a> {
    previous: Option<&'a ExecutionRecord>,
    current: &'a ExecutionRecord,
    normalization: &'a NormalizationStrategy,
}

impl<'a> InputFilesTaskStateChanges<'a> {
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

impl TaskStateChanges for InputFilesTaskStateChanges<'_> {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        let Some(previous) = self.previous else {
            return Box::new(std::iter::empty());
        };
        property_changes(
            FileRole::Input,
            &previous.input_files,
            &self.current.input_files,
            self.normalization,
            mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectionError;
    use crate::snapshot::{FileCollectionSnapshot, FileSnapshot};
    use crate::test_support::record;
    use kiln_common::PathSensitivity;

    #[test]
    fn added_input_reported_in_both_modes() {
        let norm = NormalizationStrategy::absolute();
        let previous = record().with_input_files(
            "sources",
            FileCollectionSnapshot::new().with("a.c", FileSnapshot::file(b"a")),
        );
        let current = record().with_input_files(
            "sources",
            FileCollectionSnapshot::new()
                .with("a.c", FileSnapshot::file(b"a"))
                .with("b.c", FileSnapshot::file(b"b")),
        );
        let source = InputFilesTaskStateChanges::new(Some(&previous), &current, &norm);
        for mode in [ChangeMode::ExcludingAdded, ChangeMode::IncludingAdded] {
            let changes = source.collect_changes(mode).unwrap();
            assert_eq!(changes.len(), 1);
            assert!(!changes[0].is_addition());
            assert_eq!(
                changes[0].message(),
                "Input property 'sources' file b.c has been added."
            );
        }
    }

    #[test]
    fn properties_visited_in_name_order() {
        let norm = NormalizationStrategy::absolute();
        let previous = record()
            .with_input_files("zlib", FileCollectionSnapshot::new().with("z.h", FileSnapshot::file(b"1")))
            .with_input_files("headers", FileCollectionSnapshot::new().with("h.h", FileSnapshot::file(b"1")));
        let current = record()
            .with_input_files("zlib", FileCollectionSnapshot::new().with("z.h", FileSnapshot::file(b"2")))
            .with_input_files("headers", FileCollectionSnapshot::new().with("h.h", FileSnapshot::file(b"2")));
        let changes = InputFilesTaskStateChanges::new(Some(&previous), &current, &norm)
            .collect_changes(ChangeMode::ExcludingAdded)
            .unwrap();
        assert_eq!(changes[0].message(), "Input property 'headers' file h.h has changed.");
        assert_eq!(changes[1].message(), "Input property 'zlib' file z.h has changed.");
    }

    #[test]
    fn normalization_failure_surfaces_as_error() {
        let norm = NormalizationStrategy::new(PathSensitivity::NameOnly, Vec::<String>::new());
        let previous = record();
        let current = record().with_input_files(
            "libs",
            FileCollectionSnapshot::new()
                .with("a/util.a", FileSnapshot::file(b"1"))
                .with("b/util.a", FileSnapshot::file(b"2")),
        );
        let previous = previous.with_input_files("libs", FileCollectionSnapshot::new());
        let err = InputFilesTaskStateChanges::new(Some(&previous), &current, &norm)
            .collect_changes(ChangeMode::ExcludingAdded)
            .unwrap_err();
        assert!(matches!(err, DetectionError::AmbiguousNormalization { .. }));
    }
}
