//! Tensor descriptor table.

use crate::codec::WireReader;
use crate::quant::{self, ElementEncoding};
use ggufscope_core::{DecodeConfig, GgufError, Result};
use std::io::Read;
use tracing::trace;

/// Information about one tensor in a GGUF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDescriptor {
    /// Tensor name. Not guaranteed unique by the format.
    pub name: String,
    /// Extents as stored, possibly empty for a scalar.
    pub dimensions: Vec<u64>,
    /// Numeric or quantization scheme of the payload.
    pub encoding: ElementEncoding,
    /// Byte offset of the payload from the data region base.
    pub relative_offset: u64,
}

impl TensorDescriptor {
    /// Product of all dimensions.
    pub fn element_count(&self) -> Result<u64> {
        quant::element_count(&self.dimensions)
    }

    /// Exact byte size of the payload.
    pub fn byte_size(&self) -> Result<u64> {
        quant::tensor_byte_size(&self.dimensions, self.encoding)
    }

    /// Shape rendered as `d0×d1×…`.
    pub fn shape_string(&self) -> String {
        let dims: Vec<String> = self.dimensions.iter().map(|d| d.to_string()).collect();
        dims.join("×")
    }
}

/// Decode one descriptor: name, dimension count, extents, encoding code,
/// relative offset.
pub(crate) fn decode_descriptor<R: Read>(
    reader: &mut WireReader<R>,
    config: &DecodeConfig,
) -> Result<TensorDescriptor> {
    let name = reader.read_string(config.max_string_len)?;

    let n_dims = reader.read_u32()?;
    if n_dims > config.max_dimensions {
        return Err(GgufError::InvalidFormat(format!(
            "tensor {:?} has {} dimensions, limit is {}",
            name, n_dims, config.max_dimensions
        )));
    }

    let mut dimensions = Vec::with_capacity(n_dims as usize);
    for _ in 0..n_dims {
        dimensions.push(reader.read_count()?);
    }

    let encoding = ElementEncoding::from_code(reader.read_u32()?);
    let relative_offset = reader.read_count()?;

    trace!(
        tensor = %name,
        dims = ?dimensions,
        encoding = %encoding,
        offset = relative_offset,
        "Decoded tensor descriptor"
    );

    Ok(TensorDescriptor {
        name,
        dimensions,
        encoding,
        relative_offset,
    })
}
