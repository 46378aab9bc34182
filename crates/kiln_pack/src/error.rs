//! Error types for packing and unpacking.

/// Errors that can occur while packing or unpacking an archive.
///
/// Unlike change detection, packing has no safe default: every failure is
/// surfaced so a damaged artifact is never treated as valid.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// Reading or writing a stream or file failed.
    #[error("I/O error on '{name}': {source}")]
    Io {
        /// The entry, file, or stream involved.
        name: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The archive ended in the middle of an entry.
    #[error("archive truncated while reading {what}")]
    Truncated {
        /// The part of the archive that was incomplete.
        what: String,
    },

    /// The stream does not start with a valid archive header.
    #[error("invalid archive header: {reason}")]
    InvalidHeader {
        /// Description of the header problem.
        reason: String,
    },

    /// The archive was written in an unsupported format version.
    #[error("archive version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The format version this build reads.
        expected: u32,
        /// The version found in the stream.
        actual: u32,
    },

    /// A source produced a different number of bytes than it declared.
    #[error("entry '{name}' declared {expected} bytes but produced {actual}")]
    SizeMismatch {
        /// Entry name.
        name: String,
        /// Declared size.
        expected: u64,
        /// Bytes actually read from the source.
        actual: u64,
    },

    /// An entry name cannot be restored safely.
    #[error("invalid entry name '{name}': {reason}")]
    InvalidEntryName {
        /// The offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An entry header could not be encoded or decoded.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl PackError {
    /// Wraps an I/O error, reporting an unexpected end of stream as truncation.
    pub(crate) fn stream(name: impl Into<String>, source: std::io::Error) -> Self {
        let name = name.into();
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            PackError::Truncated { what: name }
        } else {
            PackError::Io { name, source }
        }
    }
}
