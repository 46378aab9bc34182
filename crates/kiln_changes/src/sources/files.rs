//! Shared comparison of per-property file snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::iter;

use crate::change::{ChangeMode, TaskStateChange};
use crate::snapshot::{FileChange, FileChangeKind, FileCollectionSnapshot, NormalizationStrategy};
use crate::source::ChangeIter;

/// Whether the compared files are task inputs or outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileRole {
    Input,
    Output,
}

impl FileRole {
    fn label(self) -> &'static str {
        match self {
            FileRole::Input => "Input",
            FileRole::Output => "Output",
        }
    }

    /// Only newly appearing outputs are additions; a new input always counts.
    fn change(self, kind: FileChangeKind, message: String) -> TaskStateChange {
        match (self, kind) {
            (FileRole::Output, FileChangeKind::Added) => TaskStateChange::addition(message),
            _ => TaskStateChange::modification(message),
        }
    }

    fn include_added(self, mode: ChangeMode) -> bool {
        self == FileRole::Input || mode == ChangeMode::IncludingAdded
    }
}

/// Formats a file-level change under `title`.
pub(crate) fn file_change_message(title: &str, change: &FileChange) -> String {
    format!("{title} {change}")
}

/// Lazily compares every file property present in either record.
///
/// Properties are visited in name order. A property present on one side only
/// is reported once at property level instead of file by file.
pub(crate) fn property_changes<'s>(
    role: FileRole,
    previous: &'s BTreeMap<String, FileCollectionSnapshot>,
    current: &'s BTreeMap<String, FileCollectionSnapshot>,
    normalization: &'s NormalizationStrategy,
    mode: ChangeMode,
) -> ChangeIter<'s> {
    let names: BTreeSet<&'s str> = previous
        .keys()
        .chain(current.keys())
        .map(String::as_str)
        .collect();
    let include_added = role.include_added(mode);

    Box::new(names.into_iter().flat_map(move |name| -> ChangeIter<'s> {
        let title = format!("{} property '{name}'", role.label());
        match (previous.get(name), current.get(name)) {
            (Some(before), Some(now)) => Box::new(
                now.changes_since(before, normalization, include_added)
                    .map(move |result| {
                        result.map(|change| {
                            role.change(change.kind, file_change_message(&title, &change))
                        })
                    }),
            ),
            (None, Some(_)) if include_added => Box::new(iter::once(Ok(role.change(
                FileChangeKind::Added,
                format!("{title} has been added."),
            )))),
            (Some(_), None) => Box::new(iter::once(Ok(TaskStateChange::modification(format!(
                "{title} has been removed."
            ))))),
            _ => Box::new(iter::empty()),
        }
    }))
}
