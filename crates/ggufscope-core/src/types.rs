//! Format vocabulary shared by every decoding layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GgufError, Result};

/// Byte order of the multi-byte integers and floats in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Detect the byte order from the raw four bytes of the version field.
    ///
    /// Small versions written little-endian always have a zero high byte,
    /// so a non-zero final byte marks a big-endian producer.
    #[must_use]
    pub const fn detect(version_bytes: [u8; 4]) -> Self {
        if version_bytes[3] != 0 {
            Self::Big
        } else {
            Self::Little
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => f.write_str("little-endian"),
            Self::Big => f.write_str("big-endian"),
        }
    }
}

/// Width of the "count/offset" integers on the wire.
///
/// Covers tensor and metadata counts, array and string lengths, tensor
/// dimensions and tensor offsets. Whatever the wire width, values are
/// surfaced as `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountWidth {
    /// 32-bit on the wire, widened to 64-bit.
    U32,
    /// Native 64-bit.
    U64,
}

impl CountWidth {
    /// Number of bytes one count occupies on the wire.
    #[must_use]
    pub const fn wire_bytes(&self) -> usize {
        match self {
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }
}

/// GGUF container revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatVersion {
    V1,
    V2,
    V3,
}

impl FormatVersion {
    /// Parse the version field.
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(GgufError::UnsupportedVersion(other)),
        }
    }

    /// Numeric value as stored in the header.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Count/offset width used by this revision.
    #[must_use]
    pub const fn count_width(&self) -> CountWidth {
        match self {
            Self::V1 => CountWidth::U32,
            Self::V2 | Self::V3 => CountWidth::U64,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u32())
    }
}
