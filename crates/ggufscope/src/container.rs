//! Decoded file-level state.

use crate::filetype::{FileType, FILE_TYPE_KEY};
use crate::header::decode_container;
use crate::locator::{ByteRange, TensorLocator};
use crate::metadata::Metadata;
use crate::tensor::TensorDescriptor;
use ggufscope_core::{ByteOrder, DecodeConfig, FormatVersion, GgufError, Result};
use std::io::{Read, Seek};

/// Metadata key holding the model architecture name.
pub const ARCHITECTURE_KEY: &str = "general.architecture";

/// A fully decoded GGUF header: metadata, tensor descriptors and the
/// base offset of the data region. Read-only once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    version: FormatVersion,
    byte_order: ByteOrder,
    metadata: Metadata,
    tensors: Vec<TensorDescriptor>,
    alignment: u64,
    data_region_base: u64,
}

impl Container {
    pub(crate) fn new(
        version: FormatVersion,
        byte_order: ByteOrder,
        metadata: Metadata,
        tensors: Vec<TensorDescriptor>,
        alignment: u64,
        data_region_base: u64,
    ) -> Self {
        Self {
            version,
            byte_order,
            metadata,
            tensors,
            alignment,
            data_region_base,
        }
    }

    /// Decode a container with the default configuration.
    ///
    /// `source` must be positioned at the start of the file.
    pub fn open<R: Read + Seek>(source: &mut R) -> Result<Self> {
        Self::open_with_config(source, &DecodeConfig::default())
    }

    /// Decode a container with an explicit configuration.
    pub fn open_with_config<R: Read + Seek>(source: &mut R, config: &DecodeConfig) -> Result<Self> {
        decode_container(source, config)
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Tensor descriptors in on-disk order.
    pub fn tensors(&self) -> &[TensorDescriptor] {
        &self.tensors
    }

    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    pub fn tensor_names(&self) -> Vec<&str> {
        self.tensors.iter().map(|t| t.name.as_str()).collect()
    }

    /// Alignment of the data region.
    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Absolute offset where tensor payloads begin.
    pub fn data_region_base(&self) -> u64 {
        self.data_region_base
    }

    /// First tensor with the given name.
    pub fn find_tensor(&self, name: &str) -> Result<&TensorDescriptor> {
        self.tensors
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| GgufError::NotFound(format!("tensor {:?}", name)))
    }

    /// Locator bound to this container's data region.
    pub fn locator(&self) -> TensorLocator {
        TensorLocator::new(self.data_region_base)
    }

    /// Absolute byte range of the first tensor with the given name.
    pub fn byte_range(&self, name: &str) -> Result<ByteRange> {
        self.locator().byte_range(self.find_tensor(name)?)
    }

    /// Sum of all tensor payload sizes, for progress reporting.
    pub fn total_tensor_bytes(&self) -> Result<u64> {
        self.tensors.iter().try_fold(0u64, |total, t| {
            total.checked_add(t.byte_size()?).ok_or_else(|| {
                GgufError::InvalidFormat("total tensor size overflows".to_string())
            })
        })
    }

    /// The promoted `general.file_type`.
    pub fn file_type(&self) -> Result<FileType> {
        self.metadata.get_as(FILE_TYPE_KEY)
    }

    /// The `general.architecture` string.
    pub fn architecture(&self) -> Result<&str> {
        self.metadata.get_str(ARCHITECTURE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quant::ElementEncoding;
    use crate::value::MetadataValue;

    fn tensor(name: &str, dims: &[u64], encoding: ElementEncoding, offset: u64) -> TensorDescriptor {
        TensorDescriptor {
            name: name.to_string(),
            dimensions: dims.to_vec(),
            encoding,
            relative_offset: offset,
        }
    }

    fn container(tensors: Vec<TensorDescriptor>) -> Container {
        let metadata: Metadata = [
            (
                "general.architecture".to_string(),
                MetadataValue::String("llama".into()),
            ),
            (
                FILE_TYPE_KEY.to_string(),
                MetadataValue::FileType(FileType::MostlyQ8_0),
            ),
        ]
        .into_iter()
        .collect();
        Container::new(
            FormatVersion::V3,
            ByteOrder::Little,
            metadata,
            tensors,
            32,
            96,
        )
    }

    #[test]
    fn test_find_tensor_first_match() {
        let c = container(vec![
            tensor("a", &[32], ElementEncoding::F32, 0),
            tensor("dup", &[32], ElementEncoding::Q8_0, 128),
            tensor("dup", &[64], ElementEncoding::F16, 256),
        ]);
        let t = c.find_tensor("dup").unwrap();
        assert_eq!(t.relative_offset, 128);
        assert!(matches!(c.find_tensor("nope"), Err(GgufError::NotFound(_))));
        assert_eq!(c.tensor_names(), vec!["a", "dup", "dup"]);
    }

    #[test]
    fn test_byte_range() {
        let c = container(vec![tensor("q", &[64], ElementEncoding::Q4_0, 64)]);
        let range = c.byte_range("q").unwrap();
        assert_eq!(range.offset, 96 + 64);
        assert_eq!(range.length, 36);
        assert_eq!(range.end(), 96 + 64 + 36);
    }

    #[test]
    fn test_total_tensor_bytes() {
        let c = container(vec![
            tensor("a", &[8, 4], ElementEncoding::F32, 0),
            tensor("b", &[256], ElementEncoding::Q6_K, 128),
        ]);
        assert_eq!(c.total_tensor_bytes().unwrap(), 128 + 210);

        let c = container(vec![tensor("x", &[4], ElementEncoding::Unknown(99), 0)]);
        assert!(matches!(
            c.total_tensor_bytes(),
            Err(GgufError::UnknownElementEncoding(99))
        ));
    }

    #[test]
    fn test_well_known_keys() {
        let c = container(Vec::new());
        assert_eq!(c.file_type().unwrap(), FileType::MostlyQ8_0);
        assert_eq!(c.architecture().unwrap(), "llama");
    }
}
