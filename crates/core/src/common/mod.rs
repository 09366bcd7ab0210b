//! Common types used throughout the configuration library.
//!
//! This module provides the building blocks shared by the loaders and exporters:
//! 1. **Error Handling:** The `ConfigError` enum and its `Result` alias.
//! 2. **Tensor Naming:** The `Tensor` enum used in per-tensor diagnostics.

/// Error types for the load and write paths.
pub mod error;

pub use error::{ConfigError, Result, Tensor};
