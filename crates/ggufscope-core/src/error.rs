//! Error types for ggufscope.

use thiserror::Error;

/// Result type alias for ggufscope operations.
pub type Result<T> = std::result::Result<T, GgufError>;

/// Errors that can occur while decoding or querying a GGUF container.
///
/// Decode-time variants abort the whole `open` call. [`GgufError::NotFound`]
/// and [`GgufError::TypeMismatch`] come from accessors on an already decoded
/// container and leave it usable.
#[derive(Error, Debug)]
pub enum GgufError {
    /// The first four bytes are not `GGUF`.
    #[error("Invalid magic: expected \"GGUF\", got {}", escape_magic(.0))]
    InvalidMagic([u8; 4]),

    /// Version field outside {1, 2, 3}.
    #[error("Unsupported GGUF version: {0}")]
    UnsupportedVersion(u32),

    /// Short read or any other I/O failure.
    #[error("Truncated read: {0}")]
    TruncatedRead(#[from] std::io::Error),

    /// Metadata type code (scalar or array element) that the format does not define.
    #[error("Unsupported metadata value type: {0}")]
    UnsupportedValueType(u32),

    /// Bool byte outside {0, 1}.
    #[error("Invalid bool encoding: {0}")]
    InvalidBoolEncoding(u8),

    /// `general.alignment` is present but not stored as uint32.
    #[error("Invalid alignment type: expected uint32, got {0}")]
    InvalidAlignmentType(String),

    /// Tensor element encoding with no entry in the block geometry table.
    #[error("Unknown element encoding: {0}")]
    UnknownElementEncoding(u32),

    /// Missing metadata key or tensor name.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Typed accessor asked for a kind the stored value cannot provide.
    #[error("Type mismatch for {key:?}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    /// Structurally invalid data (bad lengths, overflow, invalid UTF-8).
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid decode configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GgufError {
    /// Build a [`GgufError::TypeMismatch`].
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
            found: found.into(),
        }
    }

    /// True for errors raised by accessors rather than by decoding.
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::TypeMismatch { .. })
    }
}

fn escape_magic(magic: &[u8; 4]) -> String {
    let escaped: String = magic
        .iter()
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect();
    format!("\"{}\"", escaped)
}
