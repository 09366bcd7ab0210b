//! Positional configuration lists.
//!
//! A configuration list is an ordered sequence of values whose meaning depends on its
//! position. Index 0..=10 are mandatory; the trailing entries are conditionally required
//! by earlier ones:
//!
//! | Index | Field | Present when |
//! |---|---|---|
//! | 0 | run name | always |
//! | 1, 2 | array rows, cols | always |
//! | 3, 4, 5 | ifmap, filter, ofmap SRAM KB | always |
//! | 6, 7, 8 | ifmap, filter, ofmap offsets | always |
//! | 9 | dataflow | always |
//! | 10 | bandwidth mode (`USER` / `CALC`) | always |
//! | 11 | per-bank bandwidths | USER mode |
//! | 12 | memory bank count (default 1) | optional |
//! | 13 | per-bank memory maps | more than one bank |
//! | 14 | topology path | list has exactly 15 entries |
//!
//! The exported list has a different, fixed 13-entry layout; see
//! [`ScaleConfig::get_conf_as_list`].

use tracing::{info, warn};

use super::{BandwidthMode, Dataflow, ScaleConfig, Validity};
use crate::common::{ConfigError, Result};
use crate::memory::MemoryMap;

/// One entry of a positional configuration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfListValue {
    /// Text, or an integer written as decimal text.
    Text(String),
    /// Integer.
    Int(i64),
    /// Integer sequence (bandwidths).
    Ints(Vec<u64>),
    /// Text sequence (per-bank memory maps).
    Texts(Vec<String>),
}

impl ConfListValue {
    /// Reads the entry as text. Integers are rendered in decimal.
    fn to_text(&self, index: usize) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Int(value) => Ok(value.to_string()),
            Self::Ints(_) | Self::Texts(_) => Err(self.invalid(index)),
        }
    }

    /// Reads the entry as a non-negative integer.
    fn to_u64(&self, index: usize) -> Result<u64> {
        match self {
            Self::Int(value) => u64::try_from(*value).map_err(|_| self.invalid(index)),
            Self::Text(text) => text.trim().parse().map_err(|_| self.invalid(index)),
            Self::Ints(_) | Self::Texts(_) => Err(self.invalid(index)),
        }
    }

    fn to_usize(&self, index: usize) -> Result<usize> {
        usize::try_from(self.to_u64(index)?).map_err(|_| self.invalid(index))
    }

    /// Reads the entry as a bandwidth sequence.
    ///
    /// A single integer is a one-bank sequence; text is split on `,`.
    fn to_bandwidths(&self, index: usize) -> Result<Vec<u64>> {
        match self {
            Self::Ints(values) => Ok(values.clone()),
            Self::Int(_) => Ok(vec![self.to_u64(index)?]),
            Self::Text(text) => text
                .split(',')
                .map(|entry| entry.trim().parse().map_err(|_| self.invalid(index)))
                .collect(),
            Self::Texts(_) => Err(self.invalid(index)),
        }
    }

    fn to_texts(&self, index: usize) -> Result<Vec<String>> {
        match self {
            Self::Texts(values) => Ok(values.clone()),
            _ => Err(self.invalid(index)),
        }
    }

    fn invalid(&self, index: usize) -> ConfigError {
        ConfigError::InvalidListValue {
            index,
            value: format!("{self:?}"),
        }
    }
}

impl From<&str> for ConfListValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfListValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ConfListValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<u64>> for ConfListValue {
    fn from(values: Vec<u64>) -> Self {
        Self::Ints(values)
    }
}

impl From<Vec<String>> for ConfListValue {
    fn from(values: Vec<String>) -> Self {
        Self::Texts(values)
    }
}

/// A configuration list decoded into named fields.
///
/// Trailing fields are `None` when the list is too short to hold them, or when an
/// earlier field makes them irrelevant (bandwidths in CALC mode, memory maps for a
/// single bank).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfRecord {
    /// Run identifier.
    pub run_name: String,
    /// Array height.
    pub array_rows: usize,
    /// Array width.
    pub array_cols: usize,
    /// Ifmap SRAM size in KB.
    pub ifmap_sz_kb: usize,
    /// Filter SRAM size in KB.
    pub filter_sz_kb: usize,
    /// Ofmap SRAM size in KB.
    pub ofmap_sz_kb: usize,
    /// Ifmap base address.
    pub ifmap_offset: u64,
    /// Filter base address.
    pub filter_offset: u64,
    /// Ofmap base address.
    pub ofmap_offset: u64,
    /// Dataflow token.
    pub dataflow: Dataflow,
    /// Bandwidth mode.
    pub bandwidth_mode: BandwidthMode,
    /// Per-bank bandwidths (index 11, USER mode only).
    pub bandwidths: Option<Vec<u64>>,
    /// Bank count (index 12).
    pub memory_banks: Option<usize>,
    /// Per-bank memory maps (index 13, multi-bank only).
    pub bank_maps: Option<Vec<String>>,
    /// Topology path (index 14, exactly 15 entries only).
    pub topology_file: Option<String>,
}

impl ConfRecord {
    /// Mandatory entries: ten fields plus the bandwidth mode.
    pub const MIN_LEN: usize = 11;
    /// Below this length a warning is logged, but decoding continues.
    pub const EXPECTED_MIN_LEN: usize = 12;
    /// The only length at which the topology path is read.
    pub const TOPOLOGY_LEN: usize = 15;

    const BANDWIDTHS: usize = 11;
    const MEMORY_BANKS: usize = 12;
    const BANK_MAPS: usize = 13;
    const TOPOLOGY: usize = 14;

    /// Decodes a positional list.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ListTooShort`] for fewer than eleven entries, an invalid bandwidth
    /// mode, or a malformed entry.
    pub fn decode(list: &[ConfListValue]) -> Result<Self> {
        if list.len() < Self::MIN_LEN {
            return Err(ConfigError::ListTooShort { len: list.len() });
        }
        if list.len() < Self::EXPECTED_MIN_LEN {
            warn!(
                len = list.len(),
                "incompatible number of elements in the configuration list"
            );
        }

        let bandwidth_mode = list[10].to_text(10)?.parse::<BandwidthMode>()?;

        let bandwidths = match bandwidth_mode {
            BandwidthMode::User => list
                .get(Self::BANDWIDTHS)
                .map(|value| value.to_bandwidths(Self::BANDWIDTHS))
                .transpose()?,
            BandwidthMode::Calc => None,
        };

        let memory_banks = list
            .get(Self::MEMORY_BANKS)
            .map(|value| value.to_usize(Self::MEMORY_BANKS))
            .transpose()?;

        let bank_maps = match memory_banks {
            Some(banks) if banks > 1 => list
                .get(Self::BANK_MAPS)
                .map(|value| value.to_texts(Self::BANK_MAPS))
                .transpose()?,
            _ => None,
        };

        let topology_file = if list.len() == Self::TOPOLOGY_LEN {
            Some(list[Self::TOPOLOGY].to_text(Self::TOPOLOGY)?)
        } else {
            None
        };

        Ok(Self {
            run_name: list[0].to_text(0)?,
            array_rows: list[1].to_usize(1)?,
            array_cols: list[2].to_usize(2)?,
            ifmap_sz_kb: list[3].to_usize(3)?,
            filter_sz_kb: list[4].to_usize(4)?,
            ofmap_sz_kb: list[5].to_usize(5)?,
            ifmap_offset: list[6].to_u64(6)?,
            filter_offset: list[7].to_u64(7)?,
            ofmap_offset: list[8].to_u64(8)?,
            dataflow: Dataflow::from(list[9].to_text(9)?),
            bandwidth_mode,
            bandwidths,
            memory_banks,
            bank_maps,
            topology_file,
        })
    }
}

impl ScaleConfig {
    /// Number of entries [`get_conf_as_list`](Self::get_conf_as_list) produces.
    pub const CONF_LIST_LEN: usize = 13;

    /// Creates a configuration from a positional list.
    ///
    /// # Errors
    ///
    /// Any error [`update_from_list`](Self::update_from_list) reports.
    pub fn from_list(list: &[ConfListValue]) -> Result<Self> {
        let mut config = Self::new();
        config.update_from_list(list)?;
        Ok(config)
    }

    /// Loads the configuration from a positional list and marks it valid.
    ///
    /// A list with fewer than twelve entries only logs a warning; the checks that
    /// follow decide whether it is usable. In USER mode without index 11 the bandwidth
    /// list stays empty and fails the per-bank count check.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving `self` unchanged, if the list cannot be decoded, the
    /// bank count is zero, the bandwidth count differs from the bank count in USER
    /// mode, or a multi-bank list lacks one memory map per bank.
    pub fn update_from_list(&mut self, list: &[ConfListValue]) -> Result<()> {
        let record = ConfRecord::decode(list)?;
        let memory_banks = record.memory_banks.unwrap_or(1);
        if memory_banks == 0 {
            return Err(ConfigError::ZeroMemoryBanks);
        }

        let bandwidths = match record.bandwidth_mode {
            BandwidthMode::User => {
                let bandwidths = record.bandwidths.unwrap_or_default();
                if bandwidths.len() != memory_banks {
                    return Err(ConfigError::BandwidthCountMismatch {
                        banks: memory_banks,
                        bandwidths: bandwidths.len(),
                    });
                }
                Some(bandwidths)
            }
            BandwidthMode::Calc => None,
        };

        let mut memory_map = MemoryMap::new();
        if memory_banks > 1 {
            let bank_maps = record
                .bank_maps
                .ok_or(ConfigError::MissingMemoryMaps {
                    banks: memory_banks,
                })?;
            if bank_maps.len() != memory_banks {
                return Err(ConfigError::MemoryMapCountMismatch {
                    banks: memory_banks,
                    maps: bank_maps.len(),
                });
            }
            memory_map.configure_per_bank(bank_maps);
        } else {
            memory_map.configure_single_bank(record.filter_offset, record.ofmap_offset);
        }

        Self::warn_unsupported_dataflow(&record.dataflow);

        self.run_name = record.run_name;
        self.array_rows = record.array_rows;
        self.array_cols = record.array_cols;
        self.ifmap_sz_kb = record.ifmap_sz_kb;
        self.filter_sz_kb = record.filter_sz_kb;
        self.ofmap_sz_kb = record.ofmap_sz_kb;
        self.ifmap_offset = record.ifmap_offset;
        self.filter_offset = record.filter_offset;
        self.ofmap_offset = record.ofmap_offset;
        self.dataflow = record.dataflow;
        self.bandwidth_mode = record.bandwidth_mode;
        if let Some(bandwidths) = bandwidths {
            self.bandwidths = bandwidths;
        }
        self.memory_banks = memory_banks;
        self.memory_map = memory_map;
        if let Some(topology_file) = record.topology_file {
            self.topology_file = topology_file;
        }
        self.validity = Validity::Valid;

        info!(run_name = %self.run_name, banks = memory_banks, "loaded configuration from list");
        Ok(())
    }

    /// Exports the configuration as thirteen strings.
    ///
    /// Order: run name, rows, cols, ifmap/filter/ofmap SRAM KB, ifmap/filter/ofmap
    /// offsets, dataflow, topology path, bank count, memory map token. The last entry
    /// is an opaque reference to the memory map and must not be parsed.
    pub fn get_conf_as_list(&self) -> Option<Vec<String>> {
        self.guarded("get_conf_as_list", |c| {
            vec![
                c.run_name.clone(),
                c.array_rows.to_string(),
                c.array_cols.to_string(),
                c.ifmap_sz_kb.to_string(),
                c.filter_sz_kb.to_string(),
                c.ofmap_sz_kb.to_string(),
                c.ifmap_offset.to_string(),
                c.filter_offset.to_string(),
                c.ofmap_offset.to_string(),
                c.dataflow.to_string(),
                c.topology_file.clone(),
                c.memory_banks.to_string(),
                c.memory_map.to_string(),
            ]
        })
    }

    /// Exports a fresh default configuration, forced valid, as a list.
    pub fn get_default_conf_as_list() -> Vec<String> {
        let mut defaults = Self::new();
        defaults.force_valid();
        defaults.get_conf_as_list().unwrap_or_default()
    }
}
