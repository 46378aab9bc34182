//! Snapshots of values and file collections, and the comparison between them.
//!
//! Snapshots are captured elsewhere (see [`FileSnapshotter`](crate::FileSnapshotter)
//! for files); this module only stores and compares them. File comparison is
//! lazy: normalization and the merge walk happen as changes are pulled.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::iter::Peekable;
use std::path::{Path, PathBuf};

use kiln_common::{ContentHash, PathSensitivity};
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// What kind of filesystem entry a snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// A regular file; the hash covers its content.
    RegularFile,
    /// A directory; its contents are snapshotted as separate entries.
    Directory,
    /// Nothing exists at the path.
    Missing,
}

/// The captured state of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// Entry kind.
    pub kind: FileKind,
    /// Content hash for regular files, a fixed marker otherwise.
    pub content_hash: ContentHash,
}

impl FileSnapshot {
    /// Snapshot of a regular file with the given content.
    pub fn file(content: &[u8]) -> Self {
        Self::file_with_hash(ContentHash::from_bytes(content))
    }

    /// Snapshot of a regular file whose content hash is already known.
    pub fn file_with_hash(content_hash: ContentHash) -> Self {
        Self {
            kind: FileKind::RegularFile,
            content_hash,
        }
    }

    /// Snapshot of a directory.
    pub fn directory() -> Self {
        Self {
            kind: FileKind::Directory,
            content_hash: ContentHash::from_bytes(b"directory"),
        }
    }

    /// Snapshot of a path with nothing behind it.
    pub fn missing() -> Self {
        Self {
            kind: FileKind::Missing,
            content_hash: ContentHash::from_bytes(b"missing"),
        }
    }
}

/// An ordered set of file snapshots keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileCollectionSnapshot {
    files: BTreeMap<PathBuf, FileSnapshot>,
}

impl FileCollectionSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the state of `path`, replacing any earlier entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, snapshot: FileSnapshot) {
        self.files.insert(path.into(), snapshot);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<PathBuf>, snapshot: FileSnapshot) -> Self {
        self.insert(path, snapshot);
        self
    }

    /// Returns the snapshot recorded for `path`.
    pub fn get(&self, path: &Path) -> Option<&FileSnapshot> {
        self.files.get(path)
    }

    /// Number of recorded paths.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no paths are recorded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &FileSnapshot)> {
        self.files.iter().map(|(p, s)| (p.as_path(), s))
    }

    /// The recorded paths in order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Lazily enumerates the differences between `previous` and `self`.
    ///
    /// Paths are compared after applying `normalization`. Added entries are
    /// skipped unless `include_added` is set. Normalization failures are
    /// yielded as the single final item.
    pub fn changes_since<'s>(
        &'s self,
        previous: &'s FileCollectionSnapshot,
        normalization: &'s NormalizationStrategy,
        include_added: bool,
    ) -> FileChanges<'s> {
        FileChanges {
            current: self,
            previous,
            normalization,
            include_added,
            state: DiffState::Pending,
        }
    }
}

impl<P: Into<PathBuf>> FromIterator<(P, FileSnapshot)> for FileCollectionSnapshot {
    fn from_iter<I: IntoIterator<Item = (P, FileSnapshot)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|(p, s)| (p.into(), s)).collect(),
        }
    }
}

/// How a single path differs between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// Present now, absent before.
    Added,
    /// Present before, absent now.
    Removed,
    /// Present in both with different state.
    Modified,
}

/// One difference reported by [`FileCollectionSnapshot::changes_since`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// The path as recorded (the current one unless the file was removed).
    pub path: PathBuf,
    /// The kind of difference.
    pub kind: FileChangeKind,
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            FileChangeKind::Added => "has been added",
            FileChangeKind::Removed => "has been removed",
            FileChangeKind::Modified => "has changed",
        };
        write!(f, "file {} {what}.", self.path.display())
    }
}

/// Decides which path details are significant when comparing file snapshots.
///
/// The strategy is opaque to the change sources; only the comparison reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStrategy {
    path_sensitivity: PathSensitivity,
    ignored_names: BTreeSet<String>,
}

impl NormalizationStrategy {
    /// Creates a strategy from a path sensitivity and file names to ignore.
    pub fn new<I, S>(path_sensitivity: PathSensitivity, ignored_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path_sensitivity,
            ignored_names: ignored_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Full paths, nothing ignored.
    pub fn absolute() -> Self {
        Self::default()
    }

    /// The path sensitivity in effect.
    pub fn path_sensitivity(&self) -> PathSensitivity {
        self.path_sensitivity
    }

    /// Returns the comparison key for `path`, or `None` if it is ignored.
    fn normalize(&self, path: &Path) -> Option<PathBuf> {
        let name = path.file_name();
        if let Some(name) = name.and_then(|n| n.to_str()) {
            if self.ignored_names.contains(name) {
                return None;
            }
        }
        match (self.path_sensitivity, name) {
            (PathSensitivity::NameOnly, Some(name)) => Some(PathBuf::from(name)),
            _ => Some(path.to_path_buf()),
        }
    }

    fn normalize_collection<'s>(
        &self,
        snapshot: &'s FileCollectionSnapshot,
    ) -> Result<NormalizedFiles<'s>, DetectionError> {
        let mut normalized = NormalizedFiles::new();
        for (path, file) in snapshot.iter() {
            let Some(key) = self.normalize(path) else {
                continue;
            };
            match normalized.entry(key) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert((path, file));
                }
                btree_map::Entry::Occupied(slot) => {
                    let (first, existing) = *slot.get();
                    if existing != file {
                        return Err(DetectionError::AmbiguousNormalization {
                            key: slot.key().display().to_string(),
                            first: first.to_path_buf(),
                            second: path.to_path_buf(),
                        });
                    }
                }
            }
        }
        Ok(normalized)
    }
}

type NormalizedFiles<'s> = BTreeMap<PathBuf, (&'s Path, &'s FileSnapshot)>;
type NormalizedIter<'s> = Peekable<btree_map::IntoIter<PathBuf, (&'s Path, &'s FileSnapshot)>>;

enum DiffState<'s> {
    Pending,
    Diffing {
        current: NormalizedIter<'s>,
        previous: NormalizedIter<'s>,
    },
    Done,
}

/// Lazy iterator over the differences between two file collection snapshots.
pub struct FileChanges<'s> {
    current: &'s FileCollectionSnapshot,
    previous: &'s FileCollectionSnapshot,
    normalization: &'s NormalizationStrategy,
    include_added: bool,
    state: DiffState<'s>,
}

impl<'s> FileChanges<'s> {
    fn start(&self) -> Result<DiffState<'s>, DetectionError> {
        let current = self.normalization.normalize_collection(self.current)?;
        let previous = self.normalization.normalize_collection(self.previous)?;
        Ok(DiffState::Diffing {
            current: current.into_iter().peekable(),
            previous: previous.into_iter().peekable(),
        })
    }
}

impl Iterator for FileChanges<'_> {
    type Item = Result<FileChange, DetectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, DiffState::Pending) {
            match self.start() {
                Ok(state) => self.state = state,
                Err(err) => {
                    self.state = DiffState::Done;
                    return Some(Err(err));
                }
            }
        }

        let include_added = self.include_added;
        let DiffState::Diffing { current, previous } = &mut self.state else {
            return None;
        };

        loop {
            let order = match (current.peek(), previous.peek()) {
                (Some((c, _)), Some((p, _))) => c.cmp(p),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => return None,
            };

            let change = match order {
                std::cmp::Ordering::Less => {
                    let (_, (path, _)) = current.next()?;
                    if !include_added {
                        continue;
                    }
                    FileChange {
                        path: path.to_path_buf(),
                        kind: FileChangeKind::Added,
                    }
                }
                std::cmp::Ordering::Greater => {
                    let (_, (path, _)) = previous.next()?;
                    FileChange {
                        path: path.to_path_buf(),
                        kind: FileChangeKind::Removed,
                    }
                }
                std::cmp::Ordering::Equal => {
                    let (_, (path, now)) = current.next()?;
                    let (_, (_, before)) = previous.next()?;
                    if now == before {
                        continue;
                    }
                    FileChange {
                        path: path.to_path_buf(),
                        kind: FileChangeKind::Modified,
                    }
                }
            };
            return Some(Ok(change));
        }
    }
}

/// The captured state of an input property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueSnapshot {
    /// Structural hash of the value.
    Hash(ContentHash),
    /// The value could not be captured.
    Unavailable {
        /// Why capture failed.
        reason: String,
    },
}

impl ValueSnapshot {
    /// Snapshot of a value given its serialized bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::Hash(ContentHash::from_bytes(bytes))
    }

    /// Compares two snapshots of the value described by `subject`.
    ///
    /// Fails if either side is [`ValueSnapshot::Unavailable`].
    pub fn is_same_as(&self, other: &ValueSnapshot, subject: &str) -> Result<bool, DetectionError> {
        match (self, other) {
            (ValueSnapshot::Hash(a), ValueSnapshot::Hash(b)) => Ok(a == b),
            (ValueSnapshot::Unavailable { reason }, _) | (_, ValueSnapshot::Unavailable { reason }) => {
                Err(DetectionError::UnavailableSnapshot {
                    subject: subject.to_string(),
                    reason: reason.clone(),
                })
            }
        }
    }
}
