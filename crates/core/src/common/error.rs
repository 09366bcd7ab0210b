//! Configuration error definitions.
//!
//! This module defines the failures a load or write path can report. It provides:
//! 1. **Fatal load errors:** Bandwidth/bank mismatches, missing memory-map inputs, malformed values.
//! 2. **Aborted loads:** An unknown bandwidth-mode token, reported without touching any field.
//! 3. **Gate errors:** Attempting to export a configuration that never validated.
//!
//! Warnings (unsupported dataflow, short lists) are not errors; they are logged and the
//! load continues.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The three tensors whose placement a configuration describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tensor {
    /// Input feature map.
    Ifmap,
    /// Filter (weights).
    Filter,
    /// Output feature map.
    Ofmap,
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ifmap => write!(f, "Ifmap"),
            Self::Filter => write!(f, "Filter"),
            Self::Ofmap => write!(f, "Ofmap"),
        }
    }
}

/// Errors produced while loading or writing a configuration.
///
/// A load that returns any of these leaves the target configuration exactly as it
/// was before the call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `InterfaceBandwidth` (or list index 10) is neither `USER` nor `CALC`.
    #[error("invalid bandwidth mode '{0}': use either USER or CALC")]
    InvalidBandwidthMode(String),

    /// USER bandwidth mode, but the bandwidth count differs from the bank count.
    #[error("USER mode needs one bandwidth per memory bank: {banks} banks, {bandwidths} bandwidths")]
    BandwidthCountMismatch {
        /// Configured bank count.
        banks: usize,
        /// Number of bandwidth entries supplied.
        bandwidths: usize,
    },

    /// A multi-bank memory map file does not exist.
    #[error("{tensor} memory map file does not exist: {}", path.display())]
    MissingMemoryMapFile {
        /// Tensor whose map file is missing.
        tensor: Tensor,
        /// Path that was checked.
        path: PathBuf,
    },

    /// More than one bank, but no per-bank memory map collection was supplied.
    #[error("memory maps must be provided for {banks} memory banks")]
    MissingMemoryMaps {
        /// Configured bank count.
        banks: usize,
    },

    /// The per-bank memory map collection does not have one entry per bank.
    #[error("each memory bank needs a unique map: {banks} banks, {maps} maps")]
    MemoryMapCountMismatch {
        /// Configured bank count.
        banks: usize,
        /// Number of maps supplied.
        maps: usize,
    },

    /// `MemoryBanks` was zero.
    #[error("at least one memory bank is required")]
    ZeroMemoryBanks,

    /// A required key is absent from the INI document.
    #[error("missing key '{key}' in section [{section}]")]
    MissingKey {
        /// Section searched.
        section: &'static str,
        /// Key searched.
        key: &'static str,
    },

    /// A field could not be parsed as an integer.
    #[error("invalid value for {field}: '{value}'")]
    InvalidValue {
        /// Field (INI key) being parsed.
        field: &'static str,
        /// Raw text that failed to parse.
        value: String,
    },

    /// The positional list has fewer than the eleven mandatory entries.
    #[error("configuration list needs at least 11 entries, got {len}")]
    ListTooShort {
        /// Length of the list supplied.
        len: usize,
    },

    /// A list entry has the wrong shape or cannot be converted.
    #[error("invalid configuration list entry at index {index}: {value}")]
    InvalidListValue {
        /// Zero-based list position.
        index: usize,
        /// Debug rendering of the offending entry.
        value: String,
    },

    /// An export was requested before the configuration validated.
    #[error("no valid configuration loaded")]
    NotValid,

    /// The INI document could not be read or parsed.
    #[error("failed to read configuration file: {0}")]
    Ini(#[from] ini::Error),

    /// Writing the INI document failed.
    #[error("failed to write configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a snapshot failed.
    #[error("failed to serialize configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
