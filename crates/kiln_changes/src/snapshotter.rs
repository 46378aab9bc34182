//! Capturing file snapshots from disk.

use std::path::{Path, PathBuf};

use kiln_common::ContentHash;

use crate::error::DetectionError;
use crate::snapshot::{FileCollectionSnapshot, FileSnapshot};

/// Captures the current state of a set of paths.
pub trait FileSnapshotter {
    /// Snapshots every path in `paths`. Paths that do not exist are recorded
    /// as missing rather than failing.
    fn snapshot(&self, paths: &[PathBuf]) -> Result<FileCollectionSnapshot, DetectionError>;
}

/// Snapshots files by hashing their content on disk.
///
/// Directories are recorded as entries of their own and walked recursively in
/// sorted order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSnapshotter;

impl FsSnapshotter {
    /// Creates a filesystem snapshotter.
    pub fn new() -> Self {
        Self
    }

    /// Computes the content hash of a single file.
    pub fn hash_file(path: &Path) -> Result<ContentHash, DetectionError> {
        let content = std::fs::read(path).map_err(|e| DetectionError::io(path, e))?;
        Ok(ContentHash::from_bytes(&content))
    }

    fn snapshot_into(
        &self,
        path: &Path,
        snapshot: &mut FileCollectionSnapshot,
    ) -> Result<(), DetectionError> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                snapshot.insert(path, FileSnapshot::missing());
                return Ok(());
            }
            Err(e) => return Err(DetectionError::io(path, e)),
        };

        if !metadata.is_dir() {
            snapshot.insert(path, FileSnapshot::file_with_hash(Self::hash_file(path)?));
            return Ok(());
        }

        snapshot.insert(path, FileSnapshot::directory());
        let entries = std::fs::read_dir(path).map_err(|e| DetectionError::io(path, e))?;
        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DetectionError::io(path, e))?;
            children.push(entry.path());
        }
        children.sort();
        for child in children {
            self.snapshot_into(&child, snapshot)?;
        }
        Ok(())
    }
}

impl FileSnapshotter for FsSnapshotter {
    fn snapshot(&self, paths: &[PathBuf]) -> Result<FileCollectionSnapshot, DetectionError> {
        let mut snapshot = FileCollectionSnapshot::new();
        for path in paths {
            self.snapshot_into(path, &mut snapshot)?;
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileKind;

    #[test]
    fn hash_file_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.c");
        std::fs::write(&path, "int main() { return 0; }").unwrap();

        let h1 = FsSnapshotter::hash_file(&path).unwrap();
        let h2 = FsSnapshotter::hash_file(&path).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_file_nonexistent_errors() {
        assert!(FsSnapshotter::hash_file(Path::new("/nonexistent/file.c")).is_err());
    }

    #[test]
    fn missing_paths_recorded_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.h");
        let snap = FsSnapshotter::new().snapshot(&[path.clone()]).unwrap();
        assert_eq!(snap.get(&path).unwrap().kind, FileKind::Missing);
    }

    #[test]
    fn directories_walked_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("include");
        std::fs::create_dir_all(root.join("sys")).unwrap();
        std::fs::write(root.join("a.h"), "a").unwrap();
        std::fs::write(root.join("sys").join("b.h"), "b").unwrap();

        let snap = FsSnapshotter::new().snapshot(&[root.clone()]).unwrap();
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.get(&root).unwrap().kind, FileKind::Directory);
        assert_eq!(
            snap.get(&root.join("sys").join("b.h")).unwrap(),
            &FileSnapshot::file(b"b")
        );
    }

    #[test]
    fn content_change_changes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.h");
        std::fs::write(&path, "#define A 1").unwrap();
        let before = FsSnapshotter::new().snapshot(&[path.clone()]).unwrap();
        std::fs::write(&path, "#define A 2").unwrap();
        let after = FsSnapshotter::new().snapshot(&[path.clone()]).unwrap();
        assert_ne!(before, after);
    }
}
