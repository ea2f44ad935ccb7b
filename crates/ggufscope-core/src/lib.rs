//! # ggufscope-core
//!
//! Core infrastructure for the ggufscope decoder.
//!
//! Provides shared abstractions for:
//! - Error taxonomy ([`GgufError`]) and the crate-wide [`Result`] alias
//! - Decode configuration ([`DecodeConfig`])
//! - Format vocabulary ([`ByteOrder`], [`FormatVersion`], [`CountWidth`])

pub mod config;
pub mod error;
pub mod types;

pub use config::DecodeConfig;
pub use error::{GgufError, Result};
pub use types::{ByteOrder, CountWidth, FormatVersion};
