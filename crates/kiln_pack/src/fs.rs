//! Filesystem sources and targets.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::data::{DataSource, DataTarget, DataTargetFactory, EntryMetadata, OutputStream};
use crate::error::PackError;

fn io_error(path: &Path, source: io::Error) -> PackError {
    PackError::Io {
        name: path.display().to_string(),
        source,
    }
}

/// A file or directory on disk, packed under a logical name.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    name: String,
    path: PathBuf,
    metadata: EntryMetadata,
    size: u64,
}

impl FileDataSource {
    /// Reads the attributes of `path` and packs it as `name`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, PackError> {
        let path = path.into();
        let fs_meta = std::fs::metadata(&path).map_err(|e| io_error(&path, e))?;
        let is_directory = fs_meta.is_dir();
        let metadata = EntryMetadata {
            is_directory,
            permissions: permission_bits(&fs_meta),
        };
        Ok(Self {
            name: name.into(),
            path,
            metadata,
            size: if is_directory { 0 } else { fs_meta.len() },
        })
    }

    /// Location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn permission_bits(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(meta: &std::fs::Metadata) -> u32 {
    use crate::data::{DEFAULT_DIRECTORY_PERMISSIONS, DEFAULT_FILE_PERMISSIONS};
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, _) => DEFAULT_DIRECTORY_PERMISSIONS,
        (false, true) => DEFAULT_FILE_PERMISSIONS & !0o222,
        (false, false) => DEFAULT_FILE_PERMISSIONS,
    }
}

impl DataSource for FileDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> EntryMetadata {
        self.metadata
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, PackError> {
        if self.metadata.is_directory {
            return Ok(Box::new(io::empty()));
        }
        let file = File::open(&self.path).map_err(|e| io_error(&self.path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Lists everything under `root` as sources named relative to it.
///
/// Names use `/` separators. Entries are sorted by name within each
/// directory and every directory precedes its contents, so the order is
/// stable across runs. `root` itself is not included. Symbolic links are
/// skipped.
pub fn collect_tree(root: &Path) -> Result<Vec<FileDataSource>, PackError> {
    let mut sources = Vec::new();
    collect_into(root, "", &mut sources)?;
    Ok(sources)
}

fn collect_into(dir: &Path, prefix: &str, out: &mut Vec<FileDataSource>) -> Result<(), PackError> {
    let mut children = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;
        if file_type.is_symlink() {
            tracing::warn!(path = %path.display(), "skipping symbolic link");
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        children.push((file_name, path));
    }
    children.sort();

    for (file_name, path) in children {
        let name = if prefix.is_empty() {
            file_name
        } else {
            format!("{prefix}/{file_name}")
        };
        let source = FileDataSource::new(name.clone(), &path)?;
        let is_directory = source.metadata.is_directory;
        out.push(source);
        if is_directory {
            collect_into(&path, &name, out)?;
        }
    }
    Ok(())
}

/// A file on disk written as one unit.
///
/// Content goes to a hidden sibling file that replaces the destination only
/// when the stream is closed. A stream dropped without closing leaves the
/// destination untouched.
#[derive(Debug, Clone)]
pub struct FileDataTarget {
    name: String,
    path: PathBuf,
}

impl FileDataTarget {
    /// A target writing to `path`, reported as `name`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut file_name = OsString::from(".");
    file_name.push(path.file_name().unwrap_or_default());
    file_name.push(".partial");
    path.with_file_name(file_name)
}

struct AtomicFileStream {
    writer: Option<BufWriter<File>>,
    partial: PathBuf,
    dest: PathBuf,
}

impl AtomicFileStream {
    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("stream already closed"))
    }
}

impl Write for AtomicFileStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl OutputStream for AtomicFileStream {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        let writer = self.writer()?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(self.writer.take());
        std::fs::rename(&self.partial, &self.dest)
    }
}

impl Drop for AtomicFileStream {
    fn drop(&mut self) {
        drop(self.writer.take());
        if self.partial.exists() {
            if let Err(e) = std::fs::remove_file(&self.partial) {
                tracing::warn!(path = %self.partial.display(), error = %e, "could not remove partial file");
            }
        }
    }
}

impl DataTarget for FileDataTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<Box<dyn OutputStream + '_>, PackError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let partial = partial_path(&self.path);
        let file = File::create(&partial).map_err(|e| io_error(&partial, e))?;
        Ok(Box::new(AtomicFileStream {
            writer: Some(BufWriter::new(file)),
            partial,
            dest: self.path.clone(),
        }))
    }

    fn finish(&mut self, metadata: &EntryMetadata) -> Result<(), PackError> {
        if metadata.is_directory {
            std::fs::create_dir_all(&self.path).map_err(|e| io_error(&self.path, e))?;
        }
        restore_permissions(&self.path, metadata.permissions)
    }
}

#[cfg(unix)]
fn restore_permissions(path: &Path, permissions: u32) -> Result<(), PackError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(permissions))
        .map_err(|e| io_error(path, e))
}

#[cfg(not(unix))]
fn restore_permissions(path: &Path, permissions: u32) -> Result<(), PackError> {
    let mut perms = std::fs::metadata(path)
        .map_err(|e| io_error(path, e))?
        .permissions();
    perms.set_readonly(permissions & 0o222 == 0);
    std::fs::set_permissions(path, perms).map_err(|e| io_error(path, e))
}

/// Restores unpacked entries beneath a root directory.
///
/// Names must be relative and may not leave the root. Directory permissions
/// are applied in [`complete`](DataTargetFactory::complete), deepest first,
/// so a read-only directory still receives its contents.
#[derive(Debug, Clone)]
pub struct DirectoryTargetFactory {
    root: PathBuf,
    pending_modes: Vec<(PathBuf, u32)>,
    created: Vec<PathBuf>,
}

impl DirectoryTargetFactory {
    /// Restores entries beneath `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pending_modes: Vec::new(),
            created: Vec::new(),
        }
    }

    /// Maps an entry name to its location beneath the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, PackError> {
        let invalid = |reason: &str| PackError::InvalidEntryName {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        let mut path = self.root.clone();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir => return Err(invalid("name leaves the target directory")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("name is absolute"))
                }
            }
        }
        Ok(path)
    }

    /// Removes every file and directory beneath the root that this factory
    /// brought into existence, newest first. Entries that already existed
    /// are left alone.
    pub fn discard_created(&mut self) -> Result<(), PackError> {
        self.pending_modes.clear();
        for path in self.created.drain(..).rev() {
            let removed = if path.is_dir() {
                std::fs::remove_dir(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match removed {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path, e)),
            }
        }
        Ok(())
    }

    /// Records `path` and its missing ancestors below the root, outermost first.
    fn track_new(&mut self, path: &Path) {
        let root = self.root.as_path();
        let mut missing: Vec<PathBuf> = path
            .ancestors()
            .take_while(|ancestor| *ancestor != root && !ancestor.exists())
            .map(Path::to_path_buf)
            .collect();
        missing.reverse();
        self.created.extend(missing);
    }
}

/// A directory entry whose permissions wait for the factory to complete.
struct PendingDirectory {
    name: String,
}

impl DataTarget for PendingDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<Box<dyn OutputStream + '_>, PackError> {
        Err(PackError::InvalidEntryName {
            name: self.name.clone(),
            reason: "a directory has no content".to_string(),
        })
    }
}

impl DataTargetFactory for DirectoryTargetFactory {
    fn create_target(
        &mut self,
        name: &str,
        metadata: &EntryMetadata,
    ) -> Result<Box<dyn DataTarget + '_>, PackError> {
        let path = self.resolve(name)?;
        self.track_new(&path);
        if metadata.is_directory {
            std::fs::create_dir_all(&path).map_err(|e| io_error(&path, e))?;
            self.pending_modes.push((path, metadata.permissions));
            return Ok(Box::new(PendingDirectory {
                name: name.to_string(),
            }));
        }
        Ok(Box::new(FileDataTarget::new(name, path)))
    }

    fn complete(&mut self) -> Result<(), PackError> {
        let mut pending = std::mem::take(&mut self.pending_modes);
        pending.sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));
        for (path, permissions) in pending {
            restore_permissions(&path, permissions)?;
        }
        Ok(())
    }
}
