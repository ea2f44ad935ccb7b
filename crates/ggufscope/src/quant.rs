//! Tensor element encodings and their block geometry.
//!
//! Quantized tensors are stored as packed fixed-size blocks, each holding
//! a fixed number of logical values. The byte size of a tensor is
//! `(elements / values_per_block) * block_size_bytes`; plain numeric
//! encodings are the degenerate case of one value per block.

use ggufscope_core::{GgufError, Result};
use std::fmt;

/// Values per block of the legacy 32-wide quantizations.
const QK: u64 = 32;
/// Values per super-block of the K-quants.
const QK_K: u64 = 256;
/// Packed 6-bit scales/mins of Q4_K and Q5_K.
const K_SCALE_SIZE: u64 = 12;

/// Block shape of one element encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Bytes occupied by one block.
    pub block_size_bytes: u64,
    /// Logical values packed into one block.
    pub values_per_block: u64,
}

impl BlockGeometry {
    const fn new(block_size_bytes: u64, values_per_block: u64) -> Self {
        Self {
            block_size_bytes,
            values_per_block,
        }
    }

    /// Byte size of `elements` values.
    ///
    /// Integer division: a trailing partial block is dropped, matching the
    /// packing assumption that shapes are always block aligned.
    pub fn byte_size(&self, elements: u64) -> Option<u64> {
        (elements / self.values_per_block).checked_mul(self.block_size_bytes)
    }
}

/// Per-tensor element encoding.
///
/// Codes are sparse. Unrecognised codes survive decoding as
/// [`ElementEncoding::Unknown`] and only fail once a size is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum ElementEncoding {
    F32,
    F16,
    Q4_0,
    Q4_1,
    Q5_0,
    Q5_1,
    Q8_0,
    Q8_1,
    Q2_K,
    Q3_K,
    Q4_K,
    Q5_K,
    Q6_K,
    Q8_K,
    I8,
    I16,
    I32,
    Unknown(u32),
}

impl ElementEncoding {
    /// Every encoding with a known block geometry.
    pub const KNOWN: [ElementEncoding; 17] = [
        Self::F32,
        Self::F16,
        Self::Q4_0,
        Self::Q4_1,
        Self::Q5_0,
        Self::Q5_1,
        Self::Q8_0,
        Self::Q8_1,
        Self::Q2_K,
        Self::Q3_K,
        Self::Q4_K,
        Self::Q5_K,
        Self::Q6_K,
        Self::Q8_K,
        Self::I8,
        Self::I16,
        Self::I32,
    ];

    /// Map a wire code to its encoding.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::F32,
            1 => Self::F16,
            2 => Self::Q4_0,
            3 => Self::Q4_1,
            6 => Self::Q5_0,
            7 => Self::Q5_1,
            8 => Self::Q8_0,
            9 => Self::Q8_1,
            10 => Self::Q2_K,
            11 => Self::Q3_K,
            12 => Self::Q4_K,
            13 => Self::Q5_K,
            14 => Self::Q6_K,
            15 => Self::Q8_K,
            16 => Self::I8,
            17 => Self::I16,
            18 => Self::I32,
            other => Self::Unknown(other),
        }
    }

    /// Wire code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::F32 => 0,
            Self::F16 => 1,
            Self::Q4_0 => 2,
            Self::Q4_1 => 3,
            Self::Q5_0 => 6,
            Self::Q5_1 => 7,
            Self::Q8_0 => 8,
            Self::Q8_1 => 9,
            Self::Q2_K => 10,
            Self::Q3_K => 11,
            Self::Q4_K => 12,
            Self::Q5_K => 13,
            Self::Q6_K => 14,
            Self::Q8_K => 15,
            Self::I8 => 16,
            Self::I16 => 17,
            Self::I32 => 18,
            Self::Unknown(code) => *code,
        }
    }

    /// Block geometry, `None` for unknown codes.
    ///
    /// Sizes follow ggml's block structs: one or two f16 scales ahead of
    /// the packed quants, K-quants adding sub-block scales.
    #[must_use]
    pub const fn geometry(&self) -> Option<BlockGeometry> {
        let geometry = match self {
            Self::F32 => BlockGeometry::new(4, 1),
            Self::F16 => BlockGeometry::new(2, 1),
            // d + qs
            Self::Q4_0 => BlockGeometry::new(2 + QK / 2, QK),
            // d, m + qs
            Self::Q4_1 => BlockGeometry::new(2 * 2 + QK / 2, QK),
            // d + qh + qs
            Self::Q5_0 => BlockGeometry::new(2 + 4 + QK / 2, QK),
            // d, m + qh + qs
            Self::Q5_1 => BlockGeometry::new(2 * 2 + 4 + QK / 2, QK),
            // d + qs
            Self::Q8_0 => BlockGeometry::new(2 + QK, QK),
            // d, s + qs
            Self::Q8_1 => BlockGeometry::new(2 * 2 + QK, QK),
            // scales + qs + d, dmin
            Self::Q2_K => BlockGeometry::new(QK_K / 16 + QK_K / 4 + 2 * 2, QK_K),
            // hmask + qs + scales + d
            Self::Q3_K => BlockGeometry::new(QK_K / 8 + QK_K / 4 + 12 + 2, QK_K),
            // d, dmin + scales + qs
            Self::Q4_K => BlockGeometry::new(2 * 2 + K_SCALE_SIZE + QK_K / 2, QK_K),
            // d, dmin + scales + qh + qs
            Self::Q5_K => BlockGeometry::new(2 * 2 + K_SCALE_SIZE + QK_K / 8 + QK_K / 2, QK_K),
            // ql + qh + scales + d
            Self::Q6_K => BlockGeometry::new(QK_K / 2 + QK_K / 4 + QK_K / 16 + 2, QK_K),
            // d (f32) + qs + bsums
            Self::Q8_K => BlockGeometry::new(4 + QK_K + 2 * QK_K / 16, QK_K),
            Self::I8 => BlockGeometry::new(1, 1),
            Self::I16 => BlockGeometry::new(2, 1),
            Self::I32 => BlockGeometry::new(4, 1),
            Self::Unknown(_) => return None,
        };
        Some(geometry)
    }

    /// Block geometry, failing with [`GgufError::UnknownElementEncoding`].
    pub fn require_geometry(&self) -> Result<BlockGeometry> {
        self.geometry()
            .ok_or(GgufError::UnknownElementEncoding(self.code()))
    }

    /// True for block-encoded (more than one value per block) encodings.
    #[must_use]
    pub fn is_quantized(&self) -> bool {
        matches!(self.geometry(), Some(g) if g.values_per_block > 1)
    }

    /// Lower-case name, e.g. `q4_k`.
    #[must_use]
    pub fn name(&self) -> String {
        let name = match self {
            Self::F32 => "float32",
            Self::F16 => "float16",
            Self::Q4_0 => "q4_0",
            Self::Q4_1 => "q4_1",
            Self::Q5_0 => "q5_0",
            Self::Q5_1 => "q5_1",
            Self::Q8_0 => "q8_0",
            Self::Q8_1 => "q8_1",
            Self::Q2_K => "q2_k",
            Self::Q3_K => "q3_k",
            Self::Q4_K => "q4_k",
            Self::Q5_K => "q5_k",
            Self::Q6_K => "q6_k",
            Self::Q8_K => "q8_k",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::Unknown(code) => return format!("unknown({})", code),
        };
        name.to_string()
    }
}

impl fmt::Display for ElementEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Number of logical elements of a shape; the empty shape is a scalar.
pub fn element_count(dimensions: &[u64]) -> Result<u64> {
    dimensions.iter().try_fold(1u64, |acc, &d| {
        acc.checked_mul(d).ok_or_else(|| {
            GgufError::InvalidFormat(format!("element count of shape {:?} overflows", dimensions))
        })
    })
}

/// Byte size of a tensor with this shape and encoding.
pub fn tensor_byte_size(dimensions: &[u64], encoding: ElementEncoding) -> Result<u64> {
    let geometry = encoding.require_geometry()?;
    let elements = element_count(dimensions)?;
    geometry.byte_size(elements).ok_or_else(|| {
        GgufError::InvalidFormat(format!(
            "byte size of {} tensor with shape {:?} overflows",
            encoding, dimensions
        ))
    })
}
