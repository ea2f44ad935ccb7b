//! Container header parser.
//!
//! Layout:
//! - Magic `GGUF`, then a 32-bit version whose high byte doubles as the
//!   byte-order marker
//! - Tensor count and metadata count (version width)
//! - Metadata entries: string key, typed value
//! - Tensor descriptors
//! - Padding up to the alignment, then the data region

use crate::codec::WireReader;
use crate::container::Container;
use crate::filetype::{FileType, FILE_TYPE_KEY};
use crate::metadata::Metadata;
use crate::tensor::{decode_descriptor, TensorDescriptor};
use crate::value::{decode_value, MetadataValue};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use ggufscope_core::{ByteOrder, DecodeConfig, FormatVersion, GgufError, Result};
use std::collections::HashSet;
use std::io::{Read, Seek};
use tracing::{debug, trace, warn};

/// GGUF magic bytes.
pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";

/// Data region alignment when `general.alignment` is absent.
pub const DEFAULT_ALIGNMENT: u64 = 32;

/// Metadata key overriding the data region alignment.
pub const ALIGNMENT_KEY: &str = "general.alignment";

/// Descriptors reserved up front; the rest grow as they decode.
const PREALLOC_TENSORS: u64 = 4096;

/// Decode a full container from a stream positioned at offset 0.
///
/// Decoding is all-or-nothing: any failure discards everything read so far.
pub fn decode_container<R: Read + Seek>(source: &mut R, config: &DecodeConfig) -> Result<Container> {
    config.validate()?;

    let mut magic = [0u8; 4];
    source.read_exact(&mut magic)?;
    if magic != GGUF_MAGIC {
        return Err(GgufError::InvalidMagic(magic));
    }

    // The version field is read raw once: its last byte picks the byte
    // order, then the same four bytes are interpreted in that order.
    let mut version_bytes = [0u8; 4];
    source.read_exact(&mut version_bytes)?;
    let byte_order = ByteOrder::detect(version_bytes);
    let raw_version = match byte_order {
        ByteOrder::Little => LittleEndian::read_u32(&version_bytes),
        ByteOrder::Big => BigEndian::read_u32(&version_bytes),
    };
    let version = FormatVersion::from_u32(raw_version)?;

    let mut reader = WireReader::new(source, byte_order, version.count_width());

    let tensor_count = reader.read_count()?;
    if tensor_count > config.max_tensor_count {
        return Err(GgufError::InvalidFormat(format!(
            "tensor count {} exceeds limit {}",
            tensor_count, config.max_tensor_count
        )));
    }
    let metadata_count = reader.read_count()?;

    debug!(
        version = %version,
        byte_order = %byte_order,
        tensors = tensor_count,
        metadata = metadata_count,
        "Decoding GGUF header"
    );

    let metadata = decode_metadata(&mut reader, metadata_count, config)?;
    let alignment = resolve_alignment(&metadata)?;
    let tensors = decode_tensor_table(&mut reader, tensor_count, config)?;

    if config.verify_offsets {
        verify_offset_order(&tensors)?;
    }

    let table_end = reader.position()?;
    let data_region_base = align_up(table_end, alignment)?;

    debug!(
        alignment,
        table_end,
        data_region_base,
        "Decoded GGUF tensor table"
    );

    Ok(Container::new(
        version,
        byte_order,
        metadata,
        tensors,
        alignment,
        data_region_base,
    ))
}

fn decode_metadata<R: Read>(
    reader: &mut WireReader<R>,
    count: u64,
    config: &DecodeConfig,
) -> Result<Metadata> {
    let mut metadata = Metadata::new();

    for _ in 0..count {
        let key = reader.read_string(config.max_string_len)?;
        let value = match decode_value(reader, config)? {
            MetadataValue::UInt32(code) if key == FILE_TYPE_KEY => {
                MetadataValue::FileType(FileType::from_u32(code))
            }
            value => value,
        };

        trace!(key = %key, kind = %value.type_name(), "Decoded metadata entry");

        if metadata.insert(key.clone(), value).is_some() {
            warn!(key = %key, "Duplicate metadata key, keeping last value");
        }
    }

    Ok(metadata)
}

/// Alignment from `general.alignment`, which must be a non-zero uint32.
fn resolve_alignment(metadata: &Metadata) -> Result<u64> {
    match metadata.find(ALIGNMENT_KEY) {
        None => Ok(DEFAULT_ALIGNMENT),
        Some(MetadataValue::UInt32(0)) => Err(GgufError::InvalidFormat(
            "general.alignment must be non-zero".to_string(),
        )),
        Some(MetadataValue::UInt32(v)) => Ok(u64::from(*v)),
        Some(other) => Err(GgufError::InvalidAlignmentType(other.type_name())),
    }
}

fn decode_tensor_table<R: Read>(
    reader: &mut WireReader<R>,
    count: u64,
    config: &DecodeConfig,
) -> Result<Vec<TensorDescriptor>> {
    let mut tensors = Vec::with_capacity(count.min(PREALLOC_TENSORS) as usize);
    let mut seen = HashSet::new();

    for _ in 0..count {
        let tensor = decode_descriptor(reader, config)?;
        if !seen.insert(tensor.name.clone()) {
            warn!(tensor = %tensor.name, "Duplicate tensor name, lookups return the first");
        }
        tensors.push(tensor);
    }

    Ok(tensors)
}

fn verify_offset_order(tensors: &[TensorDescriptor]) -> Result<()> {
    for pair in tensors.windows(2) {
        if pair[1].relative_offset < pair[0].relative_offset {
            return Err(GgufError::InvalidFormat(format!(
                "tensor {:?} at offset {} precedes {:?} at offset {}",
                pair[1].name, pair[1].relative_offset, pair[0].name, pair[0].relative_offset
            )));
        }
    }
    Ok(())
}

/// Smallest multiple of `alignment` that is `>= position`.
pub(crate) fn align_up(position: u64, alignment: u64) -> Result<u64> {
    position
        .div_ceil(alignment)
        .checked_mul(alignment)
        .ok_or_else(|| {
            GgufError::InvalidFormat(format!(
                "position {} cannot be aligned to {}",
                position, alignment
            ))
        })
}
