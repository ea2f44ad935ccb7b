//! Decode configuration.
//!
//! The limits here only exist so that a corrupt length field fails with
//! [`GgufError::InvalidFormat`] instead of attempting an unbounded
//! allocation. They never reject a well-formed file of realistic size.

use serde::{Deserialize, Serialize};

use crate::error::{GgufError, Result};

/// Configuration for a single decode session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Maximum byte length of any string (keys, values, tensor names).
    pub max_string_len: u64,
    /// Maximum number of elements in a metadata array.
    pub max_array_len: u64,
    /// Maximum number of tensor descriptors.
    pub max_tensor_count: u64,
    /// Maximum number of dimensions per tensor.
    pub max_dimensions: u32,
    /// Reject descriptor tables whose relative offsets decrease.
    pub verify_offsets: bool,
}

impl DecodeConfig {
    /// Create a config with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_string_len: 64 * 1024 * 1024, // 64 MiB
            max_array_len: 1 << 28,
            max_tensor_count: 1 << 24,
            max_dimensions: 64,
            verify_offsets: false,
        }
    }

    /// Set the maximum string length in bytes.
    #[must_use]
    pub fn with_max_string_len(mut self, len: u64) -> Self {
        self.max_string_len = len;
        self
    }

    /// Set the maximum metadata array length.
    #[must_use]
    pub fn with_max_array_len(mut self, len: u64) -> Self {
        self.max_array_len = len;
        self
    }

    /// Set the maximum tensor count.
    #[must_use]
    pub fn with_max_tensor_count(mut self, count: u64) -> Self {
        self.max_tensor_count = count;
        self
    }

    /// Set the maximum number of dimensions per tensor.
    #[must_use]
    pub fn with_max_dimensions(mut self, dims: u32) -> Self {
        self.max_dimensions = dims;
        self
    }

    /// Enable or disable the monotonic tensor offset check.
    #[must_use]
    pub fn with_verify_offsets(mut self, enable: bool) -> Self {
        self.verify_offsets = enable;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Supported variables:
    /// - `GGUFSCOPE_MAX_STRING_LEN`: Maximum string length in bytes
    /// - `GGUFSCOPE_MAX_ARRAY_LEN`: Maximum metadata array length
    /// - `GGUFSCOPE_MAX_TENSOR_COUNT`: Maximum tensor count
    /// - `GGUFSCOPE_MAX_DIMENSIONS`: Maximum dimensions per tensor
    /// - `GGUFSCOPE_VERIFY_OFFSETS`: `1`/`true` to check offset ordering
    ///
    /// Unset or unparsable variables fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new();
        let parse_u64 = |name: &str, fallback: u64| {
            lookup(name)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            max_string_len: parse_u64("GGUFSCOPE_MAX_STRING_LEN", defaults.max_string_len),
            max_array_len: parse_u64("GGUFSCOPE_MAX_ARRAY_LEN", defaults.max_array_len),
            max_tensor_count: parse_u64("GGUFSCOPE_MAX_TENSOR_COUNT", defaults.max_tensor_count),
            max_dimensions: lookup("GGUFSCOPE_MAX_DIMENSIONS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.max_dimensions),
            verify_offsets: lookup("GGUFSCOPE_VERIFY_OFFSETS")
                .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.verify_offsets),
        }
    }

    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_string_len == 0 {
            return Err(GgufError::Config("max_string_len must be non-zero".into()));
        }
        if self.max_array_len == 0 {
            return Err(GgufError::Config("max_array_len must be non-zero".into()));
        }
        if self.max_tensor_count == 0 {
            return Err(GgufError::Config(
                "max_tensor_count must be non-zero".into(),
            ));
        }
        if self.max_dimensions == 0 {
            return Err(GgufError::Config("max_dimensions must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new()
    }
}
