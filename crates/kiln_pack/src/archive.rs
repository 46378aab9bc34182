//! The archive entry format and the packer that reads and writes it.
//!
//! A stream starts with the magic bytes `KILN` and a little-endian `u32`
//! format version. Each entry follows as a little-endian `u32` header length,
//! the bincode-encoded [`EntryHeader`], and exactly `size` content bytes.
//! There is no trailing index: the stream ends at an entry boundary.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::data::{DataSource, DataTarget, DataTargetFactory, EntryMetadata};
use crate::error::PackError;

/// Magic bytes identifying a kiln archive.
const ARCHIVE_MAGIC: [u8; 4] = *b"KILN";

/// Current archive format version.
const ARCHIVE_FORMAT_VERSION: u32 = 1;

/// Upper bound on an encoded entry header, to reject garbage lengths before
/// allocating.
const MAX_HEADER_LEN: u32 = 64 * 1024;

/// Header stored before each entry's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Entry name, `/`-separated.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Unix permission bits.
    pub permissions: u32,
    /// Number of content bytes that follow.
    pub size: u64,
}

impl EntryHeader {
    fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            is_directory: self.is_directory,
            permissions: self.permissions,
        }
    }
}

/// Counts of what a pack or unpack moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackSummary {
    /// Number of entries.
    pub entries: usize,
    /// Total content bytes, excluding headers.
    pub bytes: u64,
}

/// Writes sources into one target and restores them from one source.
///
/// Both directions make a single sequential pass over the stream.
pub trait Packer {
    /// Writes `sources` into `target` as one entry each, in the given order.
    fn pack(
        &self,
        sources: &[&dyn DataSource],
        target: &mut dyn DataTarget,
    ) -> Result<PackSummary, PackError>;

    /// Reads every entry from `source` and writes it to a target obtained
    /// from `factory`.
    fn unpack(
        &self,
        source: &dyn DataSource,
        factory: &mut dyn DataTargetFactory,
    ) -> Result<PackSummary, PackError>;
}

/// The uncompressed archive format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchivePacker;

impl ArchivePacker {
    /// Creates the packer.
    pub fn new() -> Self {
        Self
    }
}

impl Packer for ArchivePacker {
    fn pack(
        &self,
        sources: &[&dyn DataSource],
        target: &mut dyn DataTarget,
    ) -> Result<PackSummary, PackError> {
        let target_name = target.name().to_string();
        let mut stream = target.open()?;

        stream
            .write_all(&ARCHIVE_MAGIC)
            .and_then(|()| stream.write_all(&ARCHIVE_FORMAT_VERSION.to_le_bytes()))
            .map_err(|e| PackError::stream(&target_name, e))?;

        let mut summary = PackSummary::default();
        for source in sources {
            summary.bytes += write_entry(*source, &mut stream, &target_name)?;
            summary.entries += 1;
        }

        stream
            .close()
            .map_err(|e| PackError::stream(&target_name, e))?;
        tracing::debug!(
            archive = %target_name,
            entries = summary.entries,
            bytes = summary.bytes,
            "packed archive"
        );
        Ok(summary)
    }

    fn unpack(
        &self,
        source: &dyn DataSource,
        factory: &mut dyn DataTargetFactory,
    ) -> Result<PackSummary, PackError> {
        let mut reader = source.open()?;
        read_prelude(&mut reader)?;

        let mut summary = PackSummary::default();
        while let Some(header) = read_header(&mut reader)? {
            summary.bytes += restore_entry(&header, &mut reader, factory)?;
            summary.entries += 1;
        }
        factory.complete()?;

        tracing::debug!(
            archive = source.name(),
            entries = summary.entries,
            bytes = summary.bytes,
            "unpacked archive"
        );
        Ok(summary)
    }
}

fn write_entry(
    source: &dyn DataSource,
    stream: &mut impl Write,
    target_name: &str,
) -> Result<u64, PackError> {
    let metadata = source.metadata();
    let header = EntryHeader {
        name: source.name().to_string(),
        is_directory: metadata.is_directory,
        permissions: metadata.permissions,
        size: if metadata.is_directory { 0 } else { source.size() },
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| PackError::Serialization {
            reason: e.to_string(),
        })?;
    let header_len = u32::try_from(header_bytes.len())
        .ok()
        .filter(|len| *len <= MAX_HEADER_LEN)
        .ok_or_else(|| PackError::InvalidEntryName {
            name: header.name.clone(),
            reason: "entry header too large".to_string(),
        })?;

    stream
        .write_all(&header_len.to_le_bytes())
        .and_then(|()| stream.write_all(&header_bytes))
        .map_err(|e| PackError::stream(target_name, e))?;

    if metadata.is_directory {
        return Ok(0);
    }

    let mut content = source.open()?;
    let mut limited = (&mut content).take(header.size);
    let copied = io::copy(&mut limited, stream).map_err(|e| PackError::stream(&header.name, e))?;
    let mut extra = [0u8; 1];
    let overflow = content
        .read(&mut extra)
        .map_err(|e| PackError::stream(&header.name, e))?;
    if copied != header.size || overflow != 0 {
        return Err(PackError::SizeMismatch {
            name: header.name,
            expected: header.size,
            actual: copied + overflow as u64,
        });
    }
    Ok(copied)
}

fn read_prelude(reader: &mut impl Read) -> Result<(), PackError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PackError::InvalidHeader {
            reason: "stream is too short to be an archive".to_string(),
        },
        _ => PackError::stream("archive header", e),
    })?;
    if magic != ARCHIVE_MAGIC {
        return Err(PackError::InvalidHeader {
            reason: "missing magic bytes".to_string(),
        });
    }

    let mut version = [0u8; 4];
    reader
        .read_exact(&mut version)
        .map_err(|e| PackError::stream("archive version", e))?;
    let version = u32::from_le_bytes(version);
    if version != ARCHIVE_FORMAT_VERSION {
        return Err(PackError::VersionMismatch {
            expected: ARCHIVE_FORMAT_VERSION,
            actual: version,
        });
    }
    Ok(())
}

/// Reads the next entry header, or `None` at a clean end of stream.
fn read_header(reader: &mut impl Read) -> Result<Option<EntryHeader>, PackError> {
    let mut len_bytes = [0u8; 4];
    let mut filled = 0;
    while filled < len_bytes.len() {
        match reader.read(&mut len_bytes[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PackError::stream("entry header length", e)),
        }
    }
    match filled {
        0 => return Ok(None),
        4 => {}
        _ => {
            return Err(PackError::Truncated {
                what: "entry header length".to_string(),
            })
        }
    }

    let header_len = u32::from_le_bytes(len_bytes);
    if header_len > MAX_HEADER_LEN {
        return Err(PackError::InvalidHeader {
            reason: format!("entry header length {header_len} exceeds {MAX_HEADER_LEN}"),
        });
    }
    let mut header_bytes = vec![0u8; header_len as usize];
    reader
        .read_exact(&mut header_bytes)
        .map_err(|e| PackError::stream("entry header", e))?;
    let (header, _) = bincode::serde::decode_from_slice::<EntryHeader, _>(
        &header_bytes,
        bincode::config::standard(),
    )
    .map_err(|e| PackError::Serialization {
        reason: e.to_string(),
    })?;
    Ok(Some(header))
}

fn restore_entry(
    header: &EntryHeader,
    reader: &mut impl Read,
    factory: &mut dyn DataTargetFactory,
) -> Result<u64, PackError> {
    let metadata = header.metadata();
    let mut target = factory.create_target(&header.name, &metadata)?;
    if header.is_directory {
        target.finish(&metadata)?;
        return Ok(0);
    }

    let mut stream = target.open()?;
    let copied = io::copy(&mut reader.take(header.size), &mut stream)
        .map_err(|e| PackError::stream(format!("content of {}", header.name), e))?;
    if copied != header.size {
        return Err(PackError::Truncated {
            what: format!("content of {}", header.name),
        });
    }
    stream
        .close()
        .map_err(|e| PackError::stream(&header.name, e))?;
    target.finish(&metadata)?;
    Ok(copied)
}
