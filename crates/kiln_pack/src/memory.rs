//! In-memory sources and targets.

use std::io::{self, Read, Write};

use crate::data::{
    DataSource, DataTarget, DataTargetFactory, EntryMetadata, OutputStream,
    DEFAULT_DIRECTORY_PERMISSIONS, DEFAULT_FILE_PERMISSIONS,
};
use crate::error::PackError;

/// An entry whose content is held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDataSource {
    name: String,
    metadata: EntryMetadata,
    content: Vec<u8>,
}

impl MemoryDataSource {
    /// A regular file with default permissions.
    pub fn file(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            metadata: EntryMetadata::file(DEFAULT_FILE_PERMISSIONS),
            content: content.into(),
        }
    }

    /// A directory with default permissions.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: EntryMetadata::directory(DEFAULT_DIRECTORY_PERMISSIONS),
            content: Vec::new(),
        }
    }

    /// Builder-style permission bits.
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.metadata.permissions = permissions;
        self
    }

    /// The entry's content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl DataSource for MemoryDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> EntryMetadata {
        self.metadata
    }

    fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, PackError> {
        Ok(Box::new(self.content.as_slice()))
    }
}

/// A target that collects written bytes in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDataTarget {
    name: String,
    content: Vec<u8>,
    metadata: Option<EntryMetadata>,
}

impl MemoryDataTarget {
    /// Creates an empty target.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Vec::new(),
            metadata: None,
        }
    }

    /// Bytes written so far.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Attributes applied by [`DataTarget::finish`], if it was called.
    pub fn metadata(&self) -> Option<EntryMetadata> {
        self.metadata
    }

    /// Turns the written target back into a source with the same name,
    /// content, and attributes.
    pub fn into_source(self) -> MemoryDataSource {
        MemoryDataSource {
            name: self.name,
            metadata: self
                .metadata
                .unwrap_or(EntryMetadata::file(DEFAULT_FILE_PERMISSIONS)),
            content: self.content,
        }
    }
}

struct VecStream<'a>(&'a mut Vec<u8>);

impl Write for VecStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputStream for VecStream<'_> {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl DataTarget for MemoryDataTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<Box<dyn OutputStream + '_>, PackError> {
        self.content.clear();
        Ok(Box::new(VecStream(&mut self.content)))
    }

    fn finish(&mut self, metadata: &EntryMetadata) -> Result<(), PackError> {
        self.metadata = Some(*metadata);
        Ok(())
    }
}

/// Collects unpacked entries in memory, in the order they were read.
#[derive(Debug, Default)]
pub struct MemoryTargetFactory {
    targets: Vec<MemoryDataTarget>,
}

impl MemoryTargetFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets created so far.
    pub fn targets(&self) -> &[MemoryDataTarget] {
        &self.targets
    }

    /// Converts every target into a source.
    pub fn into_sources(self) -> Vec<MemoryDataSource> {
        self.targets
            .into_iter()
            .map(MemoryDataTarget::into_source)
            .collect()
    }
}

impl DataTargetFactory for MemoryTargetFactory {
    fn create_target(
        &mut self,
        name: &str,
        _metadata: &EntryMetadata,
    ) -> Result<Box<dyn DataTarget + '_>, PackError> {
        let index = self.targets.len();
        self.targets.push(MemoryDataTarget::new(name));
        Ok(Box::new(&mut self.targets[index]))
    }
}
