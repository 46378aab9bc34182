//! Packing of cache artifacts into a single sequential archive stream.
//!
//! A [`Packer`] writes an ordered list of [`DataSource`]s into one
//! [`DataTarget`] and reads them back out through a [`DataTargetFactory`].
//! [`ArchivePacker`] implements the entry format; [`GzipPacker`] wraps any
//! packer in gzip compression without knowing that format.

#![warn(missing_docs)]

pub mod archive;
pub mod data;
pub mod error;
pub mod fs;
pub mod gzip;
pub mod memory;

pub use archive::{ArchivePacker, PackSummary, Packer};
pub use data::{DataSource, DataTarget, DataTargetFactory, EntryMetadata, OutputStream};
pub use error::PackError;
pub use fs::{collect_tree, DirectoryTargetFactory, FileDataSource, FileDataTarget};
pub use gzip::GzipPacker;
pub use memory::{MemoryDataSource, MemoryDataTarget, MemoryTargetFactory};
