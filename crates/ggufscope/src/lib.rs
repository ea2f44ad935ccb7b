//! # ggufscope
//!
//! Read-only decoder for GGUF model containers.
//!
//! A GGUF file is a small header (magic, version, counts), a typed
//! key/value metadata table, a table of tensor descriptors and an aligned
//! data region holding the raw tensor payloads. This crate decodes the
//! first three and tells you exactly where each payload lives:
//!
//! 1. **Header** - magic, version (1-3) and byte order detection
//! 2. **Metadata** - all 13 value kinds, one-level arrays, typed lookups
//! 3. **Tensors** - descriptors, block-geometry sizes and absolute ranges
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ggufscope::GgufFile;
//!
//! let mut file = GgufFile::open_path("model.gguf")?;
//! let container = file.container();
//!
//! println!("GGUF {} ({})", container.version(), container.byte_order());
//! let context: u32 = container.metadata().get_as("llama.context_length")?;
//! println!("context length: {}", context);
//!
//! for tensor in container.tensors() {
//!     println!("{}: {} [{}]", tensor.name, tensor.encoding, tensor.shape_string());
//! }
//!
//! let embeddings = file.read_tensor("token_embd.weight")?;
//! # Ok::<(), ggufscope::GgufError>(())
//! ```
//!
//! ## Modules
//!
//! - [`codec`] - Endian- and version-aware primitive reads
//! - [`value`] - Metadata value kinds and the value decoder
//! - [`metadata`] - Metadata table with typed accessors
//! - [`tensor`] - Tensor descriptors
//! - [`quant`] - Element encodings and block geometry
//! - [`header`] - Container header parser
//! - [`locator`] - Absolute byte ranges and bounded tensor readers
//! - [`reader`] - File-level reader

pub mod codec;
pub mod container;
pub mod filetype;
pub mod header;
pub mod locator;
pub mod metadata;
pub mod quant;
pub mod reader;
pub mod tensor;
pub mod value;

// Re-export main types
pub use container::{Container, ARCHITECTURE_KEY};
pub use filetype::{FileType, FILE_TYPE_KEY};
pub use header::{decode_container, ALIGNMENT_KEY, DEFAULT_ALIGNMENT, GGUF_MAGIC};
pub use locator::{ByteRange, TensorLocator, TensorSection};
pub use metadata::{ArrayElement, FromMetadata, Metadata};
pub use quant::{element_count, tensor_byte_size, BlockGeometry, ElementEncoding};
pub use reader::{is_gguf, GgufFile};
pub use tensor::TensorDescriptor;
pub use value::{MetadataArray, MetadataValue, ValueKind};

pub use ggufscope_core::{
    ByteOrder, CountWidth, DecodeConfig, FormatVersion, GgufError, Result,
};
