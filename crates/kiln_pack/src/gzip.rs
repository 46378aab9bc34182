//! Gzip compression layered over another packer.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::archive::{PackSummary, Packer};
use crate::data::{DataSource, DataTarget, DataTargetFactory, EntryMetadata, OutputStream};
use crate::error::PackError;

/// Default gzip compression level.
pub const DEFAULT_LEVEL: u32 = 6;

/// Compresses the stream written by the wrapped packer and decompresses the
/// stream it reads. Knows nothing about the entry format.
#[derive(Debug, Clone, Copy)]
pub struct GzipPacker<P> {
    inner: P,
    level: Compression,
}

impl<P: Packer> GzipPacker<P> {
    /// Wraps `inner` at the default compression level.
    pub fn new(inner: P) -> Self {
        Self::with_level(inner, DEFAULT_LEVEL)
    }

    /// Wraps `inner` at `level`, clamped to `0..=9`.
    pub fn with_level(inner: P, level: u32) -> Self {
        Self {
            inner,
            level: Compression::new(level.min(9)),
        }
    }
}

impl<P: Packer> Packer for GzipPacker<P> {
    fn pack(
        &self,
        sources: &[&dyn DataSource],
        target: &mut dyn DataTarget,
    ) -> Result<PackSummary, PackError> {
        let mut compressed = GzipTarget {
            inner: target,
            level: self.level,
        };
        self.inner.pack(sources, &mut compressed)
    }

    fn unpack(
        &self,
        source: &dyn DataSource,
        factory: &mut dyn DataTargetFactory,
    ) -> Result<PackSummary, PackError> {
        self.inner.unpack(&GzipSource { inner: source }, factory)
    }
}

struct GzipTarget<'t> {
    inner: &'t mut dyn DataTarget,
    level: Compression,
}

impl DataTarget for GzipTarget<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open(&mut self) -> Result<Box<dyn OutputStream + '_>, PackError> {
        let level = self.level;
        let stream = self.inner.open()?;
        Ok(Box::new(GzipStream {
            encoder: GzEncoder::new(stream, level),
        }))
    }

    fn finish(&mut self, metadata: &EntryMetadata) -> Result<(), PackError> {
        self.inner.finish(metadata)
    }
}

struct GzipStream<'s> {
    encoder: GzEncoder<Box<dyn OutputStream + 's>>,
}

impl Write for GzipStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl OutputStream for GzipStream<'_> {
    fn close(self: Box<Self>) -> io::Result<()> {
        let inner = self.encoder.finish()?;
        inner.close()
    }
}

struct GzipSource<'s> {
    inner: &'s dyn DataSource,
}

impl DataSource for GzipSource<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn metadata(&self) -> EntryMetadata {
        self.inner.metadata()
    }

    /// Size of the compressed stream.
    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, PackError> {
        let stream = self.inner.open()?;
        Ok(Box::new(GzDecoder::new(stream)))
    }
}
