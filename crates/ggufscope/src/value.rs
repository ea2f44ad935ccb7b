//! Self-describing metadata values.
//!
//! Each value on the wire is a 32-bit type code followed by its payload.
//! Arrays carry a second type code for the element kind plus a
//! version-width length; the format defines a single array level only.

use crate::codec::WireReader;
use crate::filetype::FileType;
use ggufscope_core::{DecodeConfig, GgufError, Result};
use std::fmt;
use std::io::Read;

/// Upper bound on up-front capacity reserved for arrays, so a corrupt
/// length cannot force a huge allocation before the data runs out.
const PREALLOC_LIMIT: usize = 4096;

/// GGUF metadata value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ValueKind {
    UInt8 = 0,
    Int8 = 1,
    UInt16 = 2,
    Int16 = 3,
    UInt32 = 4,
    Int32 = 5,
    Float32 = 6,
    Bool = 7,
    String = 8,
    Array = 9,
    // Added in v2
    UInt64 = 10,
    Int64 = 11,
    Float64 = 12,
}

impl ValueKind {
    /// Parse a wire type code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::UInt8),
            1 => Some(Self::Int8),
            2 => Some(Self::UInt16),
            3 => Some(Self::Int16),
            4 => Some(Self::UInt32),
            5 => Some(Self::Int32),
            6 => Some(Self::Float32),
            7 => Some(Self::Bool),
            8 => Some(Self::String),
            9 => Some(Self::Array),
            10 => Some(Self::UInt64),
            11 => Some(Self::Int64),
            12 => Some(Self::Float64),
            _ => None,
        }
    }

    /// Wire type code.
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Lower-case type name as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::Int8 => "int8",
            Self::UInt16 => "uint16",
            Self::Int16 => "int16",
            Self::UInt32 => "uint32",
            Self::Int32 => "int32",
            Self::Float32 => "float32",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array => "array",
            Self::UInt64 => "uint64",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded metadata array. Elements all share the declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataArray {
    UInt8(Vec<u8>),
    Int8(Vec<i8>),
    UInt16(Vec<u16>),
    Int16(Vec<i16>),
    UInt32(Vec<u32>),
    Int32(Vec<i32>),
    UInt64(Vec<u64>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    String(Vec<String>),
}

impl MetadataArray {
    /// Declared element kind.
    pub fn element_kind(&self) -> ValueKind {
        match self {
            Self::UInt8(_) => ValueKind::UInt8,
            Self::Int8(_) => ValueKind::Int8,
            Self::UInt16(_) => ValueKind::UInt16,
            Self::Int16(_) => ValueKind::Int16,
            Self::UInt32(_) => ValueKind::UInt32,
            Self::Int32(_) => ValueKind::Int32,
            Self::UInt64(_) => ValueKind::UInt64,
            Self::Int64(_) => ValueKind::Int64,
            Self::Float32(_) => ValueKind::Float32,
            Self::Float64(_) => ValueKind::Float64,
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::UInt8(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::UInt16(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::UInt32(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    String(String),
    Array(MetadataArray),
    /// `general.file_type`, promoted from its `uint32` wire form.
    FileType(FileType),
}

impl MetadataValue {
    /// Wire kind of this value. A promoted file type reports `uint32`.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::UInt8(_) => ValueKind::UInt8,
            Self::Int8(_) => ValueKind::Int8,
            Self::UInt16(_) => ValueKind::UInt16,
            Self::Int16(_) => ValueKind::Int16,
            Self::UInt32(_) | Self::FileType(_) => ValueKind::UInt32,
            Self::Int32(_) => ValueKind::Int32,
            Self::UInt64(_) => ValueKind::UInt64,
            Self::Int64(_) => ValueKind::Int64,
            Self::Float32(_) => ValueKind::Float32,
            Self::Float64(_) => ValueKind::Float64,
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
        }
    }

    /// Human readable type description, e.g. `uint32` or `array[string]`.
    pub fn type_name(&self) -> String {
        match self {
            Self::Array(a) => format!("array[{}]", a.element_kind()),
            Self::FileType(_) => "file_type".to_string(),
            other => other.kind().name().to_string(),
        }
    }

    /// Get as string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as bool if this is a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the array if this is an array value.
    pub fn as_array(&self) -> Option<&MetadataArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as u64 if this is an integer that fits without loss.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt8(v) => Some(u64::from(*v)),
            Self::UInt16(v) => Some(u64::from(*v)),
            Self::UInt32(v) => Some(u64::from(*v)),
            Self::UInt64(v) => Some(*v),
            Self::Int8(v) => u64::try_from(*v).ok(),
            Self::Int16(v) => u64::try_from(*v).ok(),
            Self::Int32(v) => u64::try_from(*v).ok(),
            Self::Int64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer that fits without loss.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int8(v) => Some(i64::from(*v)),
            Self::Int16(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            Self::UInt8(v) => Some(i64::from(*v)),
            Self::UInt16(v) => Some(i64::from(*v)),
            Self::UInt32(v) => Some(i64::from(*v)),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get as f64 if this is a numeric value that converts exactly.
    ///
    /// 64-bit integers outside the 53-bit mantissa are rejected unless they
    /// happen to be representable.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(v) => Some(f64::from(*v)),
            Self::Float64(v) => Some(*v),
            Self::UInt64(v) => u64_to_f64_exact(*v),
            Self::Int64(v) => i64_to_f64_exact(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }
}

// `as` saturates on the way back, so values that round up to 2^64 / 2^63
// would otherwise compare equal.
fn u64_to_f64_exact(v: u64) -> Option<f64> {
    let f = v as f64;
    (f < u64::MAX as f64 && f as u64 == v).then_some(f)
}

fn i64_to_f64_exact(v: i64) -> Option<f64> {
    let f = v as f64;
    (f < i64::MAX as f64 && f as i64 == v).then_some(f)
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt8(v) => write!(f, "{}", v),
            Self::Int8(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::String(s) => f.write_str(s),
            Self::Array(a) => write!(f, "[{}]{}", a.len(), a.element_kind()),
            Self::FileType(t) => write!(f, "{}", t),
        }
    }
}

/// Decode one typed value at the current position.
pub fn decode_value<R: Read>(
    reader: &mut WireReader<R>,
    config: &DecodeConfig,
) -> Result<MetadataValue> {
    let code = reader.read_u32()?;
    let kind = ValueKind::from_code(code).ok_or(GgufError::UnsupportedValueType(code))?;

    match kind {
        ValueKind::Array => Ok(MetadataValue::Array(decode_array(reader, config)?)),
        ValueKind::UInt8 => Ok(MetadataValue::UInt8(reader.read_u8()?)),
        ValueKind::Int8 => Ok(MetadataValue::Int8(reader.read_i8()?)),
        ValueKind::UInt16 => Ok(MetadataValue::UInt16(reader.read_u16()?)),
        ValueKind::Int16 => Ok(MetadataValue::Int16(reader.read_i16()?)),
        ValueKind::UInt32 => Ok(MetadataValue::UInt32(reader.read_u32()?)),
        ValueKind::Int32 => Ok(MetadataValue::Int32(reader.read_i32()?)),
        ValueKind::UInt64 => Ok(MetadataValue::UInt64(reader.read_u64()?)),
        ValueKind::Int64 => Ok(MetadataValue::Int64(reader.read_i64()?)),
        ValueKind::Float32 => Ok(MetadataValue::Float32(reader.read_f32()?)),
        ValueKind::Float64 => Ok(MetadataValue::Float64(reader.read_f64()?)),
        ValueKind::Bool => Ok(MetadataValue::Bool(reader.read_bool()?)),
        ValueKind::String => Ok(MetadataValue::String(
            reader.read_string(config.max_string_len)?,
        )),
    }
}

/// Decode an array body: element kind, length, then the elements.
fn decode_array<R: Read>(
    reader: &mut WireReader<R>,
    config: &DecodeConfig,
) -> Result<MetadataArray> {
    let code = reader.read_u32()?;
    let kind = match ValueKind::from_code(code) {
        Some(ValueKind::Array) | None => return Err(GgufError::UnsupportedValueType(code)),
        Some(kind) => kind,
    };
    let len = reader.read_len("array", config.max_array_len)?;

    let array = match kind {
        ValueKind::UInt8 => MetadataArray::UInt8(read_elements(reader, len, WireReader::read_u8)?),
        ValueKind::Int8 => MetadataArray::Int8(read_elements(reader, len, WireReader::read_i8)?),
        ValueKind::UInt16 => {
            MetadataArray::UInt16(read_elements(reader, len, WireReader::read_u16)?)
        }
        ValueKind::Int16 => MetadataArray::Int16(read_elements(reader, len, WireReader::read_i16)?),
        ValueKind::UInt32 => {
            MetadataArray::UInt32(read_elements(reader, len, WireReader::read_u32)?)
        }
        ValueKind::Int32 => MetadataArray::Int32(read_elements(reader, len, WireReader::read_i32)?),
        ValueKind::UInt64 => {
            MetadataArray::UInt64(read_elements(reader, len, WireReader::read_u64)?)
        }
        ValueKind::Int64 => MetadataArray::Int64(read_elements(reader, len, WireReader::read_i64)?),
        ValueKind::Float32 => {
            MetadataArray::Float32(read_elements(reader, len, WireReader::read_f32)?)
        }
        ValueKind::Float64 => {
            MetadataArray::Float64(read_elements(reader, len, WireReader::read_f64)?)
        }
        ValueKind::Bool => MetadataArray::Bool(read_elements(reader, len, WireReader::read_bool)?),
        ValueKind::String => {
            let max = config.max_string_len;
            MetadataArray::String(read_elements(reader, len, |r| r.read_string(max))?)
        }
        ValueKind::Array => return Err(GgufError::UnsupportedValueType(code)),
    };

    Ok(array)
}

fn read_elements<R, T, F>(reader: &mut WireReader<R>, len: usize, mut read_one: F) -> Result<Vec<T>>
where
    R: Read,
    F: FnMut(&mut WireReader<R>) -> Result<T>,
{
    let mut values = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    for _ in 0..len {
        values.push(read_one(reader)?);
    }
    Ok(values)
}
