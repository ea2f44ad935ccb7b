//! Tensor data locator.
//!
//! Combines the data region base, a descriptor's relative offset and its
//! block-geometry size into an absolute byte range, and hands out bounded
//! readers over that range.

use crate::tensor::TensorDescriptor;
use ggufscope_core::{GgufError, Result};
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Range;

/// Absolute byte range of a tensor payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Absolute offset of the first byte.
    pub offset: u64,
    /// Number of bytes.
    pub length: u64,
}

impl ByteRange {
    /// One past the last byte, saturating at `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    pub fn as_range(&self) -> Range<u64> {
        self.offset..self.end()
    }
}

/// Resolves descriptors to absolute byte ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorLocator {
    data_region_base: u64,
}

impl TensorLocator {
    pub fn new(data_region_base: u64) -> Self {
        Self { data_region_base }
    }

    pub fn data_region_base(&self) -> u64 {
        self.data_region_base
    }

    /// `[base + relative_offset, base + relative_offset + size)`.
    ///
    /// Fails with [`GgufError::UnknownElementEncoding`] when the encoding
    /// has no block geometry.
    pub fn byte_range(&self, tensor: &TensorDescriptor) -> Result<ByteRange> {
        let length = tensor.byte_size()?;
        let offset = self
            .data_region_base
            .checked_add(tensor.relative_offset)
            .filter(|start| start.checked_add(length).is_some())
            .ok_or_else(|| {
                GgufError::InvalidFormat(format!(
                    "tensor {:?} extends past the addressable range",
                    tensor.name
                ))
            })?;
        Ok(ByteRange { offset, length })
    }
}

/// Bounded, independently seekable view over one tensor's bytes.
///
/// Positions are relative to the start of the tensor. Reads never go past
/// its end.
pub struct TensorSection<'a, R> {
    source: &'a mut R,
    range: ByteRange,
    pos: u64,
}

impl<'a, R: Read + Seek> TensorSection<'a, R> {
    /// Seek `source` to the start of `range` and wrap it.
    pub fn new(source: &'a mut R, range: ByteRange) -> Result<Self> {
        source.seek(SeekFrom::Start(range.offset))?;
        Ok(Self {
            source,
            range,
            pos: 0,
        })
    }

    /// Absolute range covered by this section.
    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn len(&self) -> u64 {
        self.range.length
    }

    pub fn is_empty(&self) -> bool {
        self.range.length == 0
    }

    /// Bytes left between the current position and the end.
    pub fn remaining(&self) -> u64 {
        self.range.length.saturating_sub(self.pos)
    }
}

impl<R: Read + Seek> Read for TensorSection<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.source.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for TensorSection<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => self.range.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        // Past-the-end positions are allowed, like `Cursor`; reads there
        // return 0.
        let clamped = target.min(self.range.length);
        let absolute = self.range.offset.checked_add(clamped).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek past the end of the addressable range",
            )
        })?;
        self.source.seek(SeekFrom::Start(absolute))?;
        self.pos = target;
        Ok(target)
    }
}
