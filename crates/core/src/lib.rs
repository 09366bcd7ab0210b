//! Systolic-array simulator configuration library.
//!
//! This crate holds the architectural description consumed by the simulator core:
//! 1. **Configuration:** Array dimensions, scratchpad sizes, offsets, dataflow, bandwidth mode.
//! 2. **Producers:** INI file loader, positional list loader, and programmatic setters.
//! 3. **Consumers:** INI file writer and positional list exporter.
//! 4. **Memory Map:** Per-bank DRAM address mapping built when a configuration validates.
//!
//! Every read goes through a validity gate: until a load path (or `force_valid`) has
//! completed, accessors return `None` and log a diagnostic.

/// Shared error type and result alias.
pub mod common;
/// Simulator configuration (defaults, enums, loaders, exporters, accessors).
pub mod config;
/// DRAM memory-bank address mapping.
pub mod memory;

/// Error raised by the fatal load and write paths.
pub use crate::common::{ConfigError, Result};
/// Root configuration type; construct with `ScaleConfig::new` and load from a file or list.
pub use crate::config::ScaleConfig;
/// Memory map owned by a validated configuration.
pub use crate::memory::MemoryMap;
