//! DRAM memory-bank address mapping.
//!
//! The memory map translates logical tensor addresses to physical bank locations. This
//! library only builds it; the mapping itself is consumed by the simulation engine.
//! It supports three construction modes:
//! 1. **Single bank:** Derived from the filter and ofmap base offsets.
//! 2. **Multi bank:** One mapping file per tensor (ifmap, filter, ofmap).
//! 3. **Per bank:** One map reference per bank, as supplied by the list loader.
//!
//! Beyond these constructors the map is opaque: its `Display` form is a reference
//! token (`memory_map#<id>`), not a serialization of its contents.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of process-unique instance ids for the opaque display token.
static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(0);

/// How a memory map was constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapMode {
    /// Freshly created; no constructor has run.
    Unconfigured,
    /// Single DRAM bank, split by tensor base offsets.
    SingleBank {
        /// Filter tensor base address.
        filter_offset: u64,
        /// Ofmap tensor base address.
        ofmap_offset: u64,
    },
    /// Several banks, mapped by per-tensor mapping files.
    MultiBank {
        /// Ifmap mapping file.
        ifmap_map_file: PathBuf,
        /// Filter mapping file.
        filter_map_file: PathBuf,
        /// Ofmap mapping file.
        ofmap_map_file: PathBuf,
    },
    /// Several banks, one map reference per bank.
    PerBank {
        /// Map reference for each bank, in bank order.
        bank_maps: Vec<String>,
    },
}

/// Per-bank address mapping owned by a [`ScaleConfig`](crate::ScaleConfig).
///
/// Clones are separate maps: they copy the mode and bank count but get their own id.
#[derive(Debug)]
pub struct MemoryMap {
    id: u64,
    num_banks: usize,
    mode: MapMode,
}

impl MemoryMap {
    /// Creates an unconfigured single-bank map with a fresh instance id.
    pub fn new() -> Self {
        Self {
            id: next_id(),
            num_banks: 1,
            mode: MapMode::Unconfigured,
        }
    }

    /// Configures multi-bank mode from the three per-tensor mapping files.
    ///
    /// The files are recorded, not read; the caller has already checked that they exist.
    pub fn configure(
        &mut self,
        num_banks: usize,
        ifmap_map_file: impl Into<PathBuf>,
        filter_map_file: impl Into<PathBuf>,
        ofmap_map_file: impl Into<PathBuf>,
    ) {
        self.num_banks = num_banks;
        self.mode = MapMode::MultiBank {
            ifmap_map_file: ifmap_map_file.into(),
            filter_map_file: filter_map_file.into(),
            ofmap_map_file: ofmap_map_file.into(),
        };
    }

    /// Configures single-bank mode from the filter and ofmap base offsets.
    pub fn configure_single_bank(&mut self, filter_offset: u64, ofmap_offset: u64) {
        self.num_banks = 1;
        self.mode = MapMode::SingleBank {
            filter_offset,
            ofmap_offset,
        };
    }

    /// Configures one map reference per bank; the bank count is the collection length.
    pub fn configure_per_bank(&mut self, bank_maps: Vec<String>) {
        self.num_banks = bank_maps.len();
        self.mode = MapMode::PerBank { bank_maps };
    }

    /// Number of banks this map spans.
    #[inline]
    pub const fn num_banks(&self) -> usize {
        self.num_banks
    }

    /// Construction mode.
    #[inline]
    pub const fn mode(&self) -> &MapMode {
        &self.mode
    }
}

impl Clone for MemoryMap {
    fn clone(&self) -> Self {
        Self {
            id: next_id(),
            num_banks: self.num_banks,
            mode: self.mode.clone(),
        }
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryMap {
    /// Formats the opaque reference token; never the map contents.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory_map#{}", self.id)
    }
}

fn next_id() -> u64 {
    NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed)
}
