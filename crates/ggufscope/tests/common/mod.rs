//! Test-only GGUF encoder.
//!
//! The library never writes GGUF; integration tests build their fixtures
//! here, in either byte order and any supported version.

#![allow(dead_code)]

use ggufscope::{
    ByteOrder, Container, CountWidth, FormatVersion, MetadataArray, MetadataValue,
    TensorDescriptor, ALIGNMENT_KEY, DEFAULT_ALIGNMENT, GGUF_MAGIC,
};

/// Endian- and width-aware byte sink.
pub struct Encoder {
    out: Vec<u8>,
    order: ByteOrder,
    width: CountWidth,
}

macro_rules! put_ordered {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, v: $ty) -> &mut Self {
                match self.order {
                    ByteOrder::Little => self.out.extend_from_slice(&v.to_le_bytes()),
                    ByteOrder::Big => self.out.extend_from_slice(&v.to_be_bytes()),
                }
                self
            }
        )*
    };
}

impl Encoder {
    pub fn new(order: ByteOrder, width: CountWidth) -> Self {
        Self {
            out: Vec::new(),
            order,
            width,
        }
    }

    put_ordered! {
        u8: u8, i8: i8, u16: u16, i16: i16, u32: u32, i32: i32,
        u64: u64, i64: i64, f32: f32, f64: f64,
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    /// Count, length or offset in the version's width.
    pub fn count(&mut self, v: u64) -> &mut Self {
        match self.width {
            CountWidth::U32 => self.u32(u32::try_from(v).expect("count fits in u32")),
            CountWidth::U64 => self.u64(v),
        }
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.count(s.len() as u64);
        self.raw(s.as_bytes())
    }

    pub fn value(&mut self, value: &MetadataValue) -> &mut Self {
        self.u32(value.kind().code());
        self.payload(value)
    }

    fn payload(&mut self, value: &MetadataValue) -> &mut Self {
        match value {
            MetadataValue::UInt8(v) => self.u8(*v),
            MetadataValue::Int8(v) => self.i8(*v),
            MetadataValue::UInt16(v) => self.u16(*v),
            MetadataValue::Int16(v) => self.i16(*v),
            MetadataValue::UInt32(v) => self.u32(*v),
            MetadataValue::Int32(v) => self.i32(*v),
            MetadataValue::UInt64(v) => self.u64(*v),
            MetadataValue::Int64(v) => self.i64(*v),
            MetadataValue::Float32(v) => self.f32(*v),
            MetadataValue::Float64(v) => self.f64(*v),
            MetadataValue::Bool(v) => self.u8(u8::from(*v)),
            MetadataValue::String(s) => self.string(s),
            MetadataValue::FileType(t) => self.u32(t.as_u32()),
            MetadataValue::Array(a) => self.array(a),
        }
    }

    fn array(&mut self, array: &MetadataArray) -> &mut Self {
        self.u32(array.element_kind().code());
        self.count(array.len() as u64);
        match array {
            MetadataArray::UInt8(v) => v.iter().for_each(|x| {
                self.u8(*x);
            }),
            MetadataArray::Int8(v) => v.iter().for_each(|x| {
                self.i8(*x);
            }),
            MetadataArray::UInt16(v) => v.iter().for_each(|x| {
                self.u16(*x);
            }),
            MetadataArray::Int16(v) => v.iter().for_each(|x| {
                self.i16(*x);
            }),
            MetadataArray::UInt32(v) => v.iter().for_each(|x| {
                self.u32(*x);
            }),
            MetadataArray::Int32(v) => v.iter().for_each(|x| {
                self.i32(*x);
            }),
            MetadataArray::UInt64(v) => v.iter().for_each(|x| {
                self.u64(*x);
            }),
            MetadataArray::Int64(v) => v.iter().for_each(|x| {
                self.i64(*x);
            }),
            MetadataArray::Float32(v) => v.iter().for_each(|x| {
                self.f32(*x);
            }),
            MetadataArray::Float64(v) => v.iter().for_each(|x| {
                self.f64(*x);
            }),
            MetadataArray::Bool(v) => v.iter().for_each(|x| {
                self.u8(u8::from(*x));
            }),
            MetadataArray::String(v) => v.iter().for_each(|x| {
                self.string(x);
            }),
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

/// Builds a complete GGUF file.
#[derive(Clone, Debug)]
pub struct GgufBuilder {
    version: u32,
    order: ByteOrder,
    metadata: Vec<(String, MetadataValue)>,
    tensors: Vec<TensorDescriptor>,
    data: Vec<u8>,
}

impl GgufBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            order: ByteOrder::Little,
            metadata: Vec::new(),
            tensors: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn v3() -> Self {
        Self::new(3)
    }

    pub fn big_endian(mut self) -> Self {
        self.order = ByteOrder::Big;
        self
    }

    pub fn kv(mut self, key: &str, value: MetadataValue) -> Self {
        self.metadata.push((key.to_string(), value));
        self
    }

    pub fn tensor(
        mut self,
        name: &str,
        dims: &[u64],
        encoding: ggufscope::ElementEncoding,
        relative_offset: u64,
    ) -> Self {
        self.tensors.push(TensorDescriptor {
            name: name.to_string(),
            dimensions: dims.to_vec(),
            encoding,
            relative_offset,
        });
        self
    }

    /// Bytes placed at the data region base.
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Rebuild the header of a decoded container.
    pub fn from_container(container: &Container) -> Self {
        Self {
            version: container.version().as_u32(),
            order: container.byte_order(),
            metadata: container
                .metadata()
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            tensors: container.tensors().to_vec(),
            data: Vec::new(),
        }
    }

    fn width(&self) -> CountWidth {
        FormatVersion::from_u32(self.version)
            .map(|v| v.count_width())
            .unwrap_or(CountWidth::U64)
    }

    fn alignment(&self) -> u64 {
        self.metadata
            .iter()
            .rev()
            .find_map(|(k, v)| match (k.as_str(), v) {
                (ALIGNMENT_KEY, MetadataValue::UInt32(a)) if *a > 0 => Some(u64::from(*a)),
                _ => None,
            })
            .unwrap_or(DEFAULT_ALIGNMENT)
    }

    /// Header and tensor table only, without padding or data.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut enc = Encoder::new(self.order, self.width());
        enc.raw(&GGUF_MAGIC).u32(self.version);
        enc.count(self.tensors.len() as u64);
        enc.count(self.metadata.len() as u64);
        for (key, value) in &self.metadata {
            enc.string(key).value(value);
        }
        for t in &self.tensors {
            enc.string(&t.name);
            enc.u32(t.dimensions.len() as u32);
            for &d in &t.dimensions {
                enc.count(d);
            }
            enc.u32(t.encoding.code());
            enc.count(t.relative_offset);
        }
        enc.into_bytes()
    }

    /// Full file: header, padding to the alignment, data.
    pub fn build(&self) -> Vec<u8> {
        let mut out = self.header_bytes();
        let alignment = self.alignment() as usize;
        out.resize(out.len().div_ceil(alignment) * alignment, 0);
        out.extend_from_slice(&self.data);
        out
    }
}

/// `n` little-endian f32 values `0.0, 1.0, ...`.
pub fn f32_payload(n: usize) -> Vec<u8> {
    (0..n).flat_map(|i| (i as f32).to_le_bytes()).collect()
}
