//! Decoded metadata table and typed accessors.

use crate::filetype::FileType;
use crate::value::{MetadataArray, MetadataValue};
use ggufscope_core::{GgufError, Result};
use std::collections::HashMap;

/// Metadata key/value table of a container.
///
/// Iteration follows on-disk entry order. A key written twice keeps its
/// first position and its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetadataValue)>,
    index: HashMap<String, usize>,
}

impl Metadata {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced.
    pub(crate) fn insert(&mut self, key: String, value: MetadataValue) -> Option<MetadataValue> {
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a value without treating absence as an error.
    pub fn find(&self, key: &str) -> Option<&MetadataValue> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    /// Iterate entries in on-disk order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries sorted by key.
    pub fn sorted(&self) -> Vec<(&str, &MetadataValue)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Get a value, failing with [`GgufError::NotFound`] when absent.
    pub fn get(&self, key: &str) -> Result<&MetadataValue> {
        self.find(key)
            .ok_or_else(|| GgufError::NotFound(format!("metadata key {:?}", key)))
    }

    /// Get a value of exactly kind `T`.
    ///
    /// No conversion between kinds happens here: asking for `u64` on a
    /// stored `uint32` is a [`GgufError::TypeMismatch`]. Use
    /// [`Metadata::get_u64`] and friends for numeric widening.
    pub fn get_as<T: FromMetadata>(&self, key: &str) -> Result<T> {
        let value = self.get(key)?;
        T::from_metadata(value)
            .ok_or_else(|| GgufError::type_mismatch(key, T::EXPECTED, value.type_name()))
    }

    /// Get a string value.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        let value = self.get(key)?;
        value
            .as_str()
            .ok_or_else(|| GgufError::type_mismatch(key, "string", value.type_name()))
    }

    /// Get an array value of any element kind.
    pub fn get_array(&self, key: &str) -> Result<&MetadataArray> {
        let value = self.get(key)?;
        value
            .as_array()
            .ok_or_else(|| GgufError::type_mismatch(key, "array", value.type_name()))
    }

    /// Get the elements of an array whose element kind is exactly `T`.
    pub fn get_array_as<T: ArrayElement>(&self, key: &str) -> Result<&[T]> {
        let value = self.get(key)?;
        value
            .as_array()
            .and_then(T::slice)
            .ok_or_else(|| GgufError::type_mismatch(key, T::EXPECTED, value.type_name()))
    }

    /// Get the promoted file type stored under `key`.
    pub fn get_file_type(&self, key: &str) -> Result<FileType> {
        self.get_as(key)
    }

    /// Get any integer value as `u64`, failing on negatives and non-integers.
    pub fn get_u64(&self, key: &str) -> Result<u64> {
        let value = self.get(key)?;
        value
            .as_u64()
            .ok_or_else(|| GgufError::type_mismatch(key, "unsigned integer", value.type_name()))
    }

    /// Get any integer value as `i64`, failing when it does not fit.
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        let value = self.get(key)?;
        value
            .as_i64()
            .ok_or_else(|| GgufError::type_mismatch(key, "integer", value.type_name()))
    }

    /// Get any numeric value as `f64`, failing when the conversion would
    /// round.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        let value = self.get(key)?;
        value
            .as_f64()
            .ok_or_else(|| GgufError::type_mismatch(key, "number", value.type_name()))
    }
}

impl FromIterator<(String, MetadataValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, MetadataValue)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// Scalar types that can be read out of a [`MetadataValue`] of the same kind.
pub trait FromMetadata: Sized {
    /// Kind name used in mismatch errors.
    const EXPECTED: &'static str;

    fn from_metadata(value: &MetadataValue) -> Option<Self>;
}

/// Element types that can be borrowed out of a [`MetadataArray`].
pub trait ArrayElement: Sized {
    /// Kind name used in mismatch errors.
    const EXPECTED: &'static str;

    fn slice(array: &MetadataArray) -> Option<&[Self]>;
}

macro_rules! impl_metadata_kind {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {
        $(
            impl FromMetadata for $ty {
                const EXPECTED: &'static str = $name;

                fn from_metadata(value: &MetadataValue) -> Option<Self> {
                    match value {
                        MetadataValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl ArrayElement for $ty {
                const EXPECTED: &'static str = concat!("array[", $name, "]");

                fn slice(array: &MetadataArray) -> Option<&[Self]> {
                    match array {
                        MetadataArray::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_metadata_kind! {
    u8 => UInt8, "uint8";
    i8 => Int8, "int8";
    u16 => UInt16, "uint16";
    i16 => Int16, "int16";
    u32 => UInt32, "uint32";
    i32 => Int32, "int32";
    u64 => UInt64, "uint64";
    i64 => Int64, "int64";
    f32 => Float32, "float32";
    f64 => Float64, "float64";
    bool => Bool, "bool";
    String => String, "string";
}

impl FromMetadata for FileType {
    const EXPECTED: &'static str = "file_type";

    fn from_metadata(value: &MetadataValue) -> Option<Self> {
        match value {
            MetadataValue::FileType(t) => Some(*t),
            _ => None,
        }
    }
}
