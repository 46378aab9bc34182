//! The read and write sides of a packed entry.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::PackError;

/// Default permission bits for regular files.
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o644;

/// Default permission bits for directories.
pub const DEFAULT_DIRECTORY_PERMISSIONS: u32 = 0o755;

/// Filesystem attributes restored alongside an entry's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Unix permission bits.
    pub permissions: u32,
}

impl EntryMetadata {
    /// A regular file with the given permission bits.
    pub fn file(permissions: u32) -> Self {
        Self {
            is_directory: false,
            permissions,
        }
    }

    /// A directory with the given permission bits.
    pub fn directory(permissions: u32) -> Self {
        Self {
            is_directory: true,
            permissions,
        }
    }

    /// Returns `true` if any execute bit is set.
    pub fn is_executable(&self) -> bool {
        self.permissions & 0o111 != 0
    }
}

/// Something that can be written into an archive as one entry.
pub trait DataSource {
    /// Logical name of the entry, `/`-separated.
    fn name(&self) -> &str;

    /// Attributes to restore on unpack.
    fn metadata(&self) -> EntryMetadata;

    /// Number of content bytes [`open`](Self::open) will produce. Zero for
    /// directories.
    fn size(&self) -> u64;

    /// Opens the content for reading. The stream is closed when dropped.
    fn open(&self) -> Result<Box<dyn Read + '_>, PackError>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn metadata(&self) -> EntryMetadata {
        (**self).metadata()
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, PackError> {
        (**self).open()
    }
}

/// A writable stream that must be closed explicitly so that buffered or
/// trailing bytes reach the underlying sink and their errors surface.
pub trait OutputStream: Write {
    /// Flushes everything and releases the stream.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// The write-side counterpart of a [`DataSource`].
pub trait DataTarget {
    /// Logical name of the target.
    fn name(&self) -> &str;

    /// Opens the target for writing, replacing earlier content.
    fn open(&mut self) -> Result<Box<dyn OutputStream + '_>, PackError>;

    /// Applies attributes once the content has been written. Directory
    /// entries are finished without being opened.
    fn finish(&mut self, _metadata: &EntryMetadata) -> Result<(), PackError> {
        Ok(())
    }
}

impl<T: DataTarget + ?Sized> DataTarget for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<Box<dyn OutputStream + '_>, PackError> {
        (**self).open()
    }

    fn finish(&mut self, metadata: &EntryMetadata) -> Result<(), PackError> {
        (**self).finish(metadata)
    }
}

/// Creates targets for entries read back out of an archive, whose names are
/// not known until they are read.
pub trait DataTargetFactory {
    /// Creates the target for the entry called `name`.
    fn create_target(
        &mut self,
        name: &str,
        metadata: &EntryMetadata,
    ) -> Result<Box<dyn DataTarget + '_>, PackError>;

    /// Called once after the last entry has been written.
    fn complete(&mut self) -> Result<(), PackError> {
        Ok(())
    }
}
