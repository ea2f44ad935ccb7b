//! Property tests for header decoding and the size model.

mod common;

use common::{Encoder, GgufBuilder};
use ggufscope::{
    tensor_byte_size, ByteOrder, Container, CountWidth, ElementEncoding, GgufError,
    MetadataArray, MetadataValue, GGUF_MAGIC,
};
use proptest::prelude::*;
use std::io::Cursor;

fn decode(bytes: &[u8]) -> ggufscope::Result<Container> {
    Container::open(&mut Cursor::new(bytes))
}

/// Strings that survive decoding unchanged (no edge padding).
fn arb_text() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,15}"
}

fn arb_scalar() -> impl Strategy<Value = MetadataValue> {
    prop_oneof![
        any::<u8>().prop_map(MetadataValue::UInt8),
        any::<i8>().prop_map(MetadataValue::Int8),
        any::<u16>().prop_map(MetadataValue::UInt16),
        any::<i16>().prop_map(MetadataValue::Int16),
        any::<u32>().prop_map(MetadataValue::UInt32),
        any::<i32>().prop_map(MetadataValue::Int32),
        any::<u64>().prop_map(MetadataValue::UInt64),
        any::<i64>().prop_map(MetadataValue::Int64),
        (-1.0e6f32..1.0e6).prop_map(MetadataValue::Float32),
        (-1.0e12f64..1.0e12).prop_map(MetadataValue::Float64),
        any::<bool>().prop_map(MetadataValue::Bool),
        arb_text().prop_map(MetadataValue::String),
    ]
}

fn arb_array() -> impl Strategy<Value = MetadataValue> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..8).prop_map(MetadataArray::UInt8),
        prop::collection::vec(any::<i32>(), 0..8).prop_map(MetadataArray::Int32),
        prop::collection::vec(any::<u64>(), 0..8).prop_map(MetadataArray::UInt64),
        prop::collection::vec(any::<bool>(), 0..8).prop_map(MetadataArray::Bool),
        prop::collection::vec(arb_text(), 0..8).prop_map(MetadataArray::String),
    ]
    .prop_map(MetadataValue::Array)
}

fn arb_value() -> impl Strategy<Value = MetadataValue> {
    prop_oneof![3 => arb_scalar(), 1 => arb_array()]
}

fn arb_encoding() -> impl Strategy<Value = ElementEncoding> {
    prop::sample::select(ElementEncoding::KNOWN.to_vec())
}

fn arb_builder() -> impl Strategy<Value = GgufBuilder> {
    (
        1u32..=3,
        any::<bool>(),
        prop::collection::btree_map(arb_text(), arb_value(), 0..8),
        prop::collection::vec(
            (arb_text(), prop::collection::vec(1u64..512, 0..4), arb_encoding()),
            0..6,
        ),
    )
        .prop_map(|(version, big, metadata, tensors)| {
            let mut builder = GgufBuilder::new(version);
            if big {
                builder = builder.big_endian();
            }
            for (key, value) in metadata {
                // Alignment has its own rules; keep it out of the generator
                if key != "general.alignment" {
                    builder = builder.kv(&key, value);
                }
            }
            let mut offset = 0u64;
            for (name, dims, encoding) in tensors {
                builder = builder.tensor(&name, &dims, encoding, offset);
                offset += 4096;
            }
            builder
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Decoding then re-encoding reproduces the header byte for byte.
    #[test]
    fn prop_header_roundtrip(builder in arb_builder()) {
        let original = builder.header_bytes();
        let container = decode(&original).unwrap();
        let rebuilt = GgufBuilder::from_container(&container).header_bytes();
        prop_assert_eq!(rebuilt, original);
    }

    /// Any magic other than GGUF is rejected before anything else is read.
    #[test]
    fn prop_invalid_magic(magic in any::<[u8; 4]>(), tail in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assume!(magic != GGUF_MAGIC);
        let mut bytes = magic.to_vec();
        bytes.extend_from_slice(&tail);
        prop_assert!(matches!(decode(&bytes), Err(GgufError::InvalidMagic(m)) if m == magic));
    }

    /// Versions outside 1..=3 are rejected in either byte order.
    #[test]
    fn prop_unsupported_version(version in any::<u32>()) {
        prop_assume!(!(1..=3).contains(&version));
        let mut bytes = GGUF_MAGIC.to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        let expected = if version >> 24 == 0 {
            version
        } else {
            version.swap_bytes()
        };
        let result = decode(&bytes);
        if (1..=3).contains(&expected) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(GgufError::UnsupportedVersion(v)) if v == expected));
        }
    }

    /// v1 counts are read as 32 bits and never wrap when widened.
    #[test]
    fn prop_v1_widening(extent in any::<u32>(), offset in any::<u32>()) {
        let bytes = GgufBuilder::new(1)
            .tensor("t", &[u64::from(extent)], ElementEncoding::F32, u64::from(offset))
            .header_bytes();
        let container = decode(&bytes).unwrap();
        let t = &container.tensors()[0];
        prop_assert_eq!(t.dimensions[0], u64::from(extent));
        prop_assert_eq!(t.relative_offset, u64::from(offset));
    }

    /// Bytes other than 0 and 1 are never accepted as booleans.
    #[test]
    fn prop_bool_domain(byte in any::<u8>()) {
        let mut enc = Encoder::new(ByteOrder::Little, CountWidth::U64);
        enc.raw(&GGUF_MAGIC).u32(3).u64(0).u64(1);
        enc.string("b").u32(7).u8(byte);
        let result = decode(&enc.into_bytes());
        match byte {
            0 | 1 => prop_assert_eq!(
                result.unwrap().metadata().get_as::<bool>("b").unwrap(),
                byte == 1
            ),
            _ => prop_assert!(matches!(result, Err(GgufError::InvalidBoolEncoding(b)) if b == byte)),
        }
    }

    /// The data region base is the first multiple of the alignment at or
    /// after the end of the tensor table.
    #[test]
    fn prop_data_region_alignment(alignment in 1u32..=8192, name in arb_text()) {
        let builder = GgufBuilder::v3()
            .kv("general.alignment", MetadataValue::UInt32(alignment))
            .tensor(&name, &[32], ElementEncoding::Q8_0, 0);
        let end = builder.header_bytes().len() as u64;
        let container = decode(&builder.build()).unwrap();
        let base = container.data_region_base();
        let a = u64::from(alignment);
        prop_assert_eq!(base % a, 0);
        prop_assert!(base >= end);
        prop_assert!(base - end < a);
    }

    /// Sizes follow `(elements / values_per_block) * block_size_bytes`.
    #[test]
    fn prop_block_size_model(encoding in arb_encoding(), dims in prop::collection::vec(1u64..4096, 0..4)) {
        let geometry = encoding.geometry().unwrap();
        let elements: u64 = dims.iter().product();
        let expected = elements / geometry.values_per_block * geometry.block_size_bytes;
        prop_assert_eq!(tensor_byte_size(&dims, encoding).unwrap(), expected);
    }

    /// Arbitrary bytes after a valid magic never panic.
    #[test]
    fn prop_garbage_never_panics(tail in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut bytes = GGUF_MAGIC.to_vec();
        bytes.extend_from_slice(&tail);
        let _ = decode(&bytes);
    }
}
