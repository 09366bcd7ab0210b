//! INI configuration files.
//!
//! This module reads and writes the simulator's INI documents. It performs:
//! 1. **Loading:** Parses every section, validates in a fixed order, and commits the
//!    staged fields in one step so a failed load leaves the configuration untouched.
//! 2. **Memory map construction:** Multi-bank inputs are checked for existence before
//!    the map is built; single-bank configurations never look at them.
//! 3. **Writing:** Emits `general`, `architecture_presets` and `network_presets`. The
//!    bandwidth mode and memory-map file references are not written back.
//!
//! Keys are matched case-insensitively. Quote and escape handling of the INI parser is
//! disabled so that the quoted `TopologyCsvLoc` value reaches the loader intact.

use std::path::Path;
use std::str::FromStr;

use ini::{EscapePolicy, Ini, ParseOption};
use tracing::{debug, error, info};

use super::{BandwidthMode, Dataflow, ScaleConfig, Validity, join_bandwidths};
use crate::common::{ConfigError, Result, Tensor};
use crate::memory::MemoryMap;

/// Section and key names of the INI document.
mod keys {
    pub const GENERAL: &str = "general";
    pub const RUN_NAME: &str = "run_name";

    pub const RUN_PRESETS: &str = "run_presets";
    pub const INTERFACE_BANDWIDTH: &str = "InterfaceBandwidth";

    pub const ARCHITECTURE: &str = "architecture_presets";
    pub const ARRAY_HEIGHT: &str = "ArrayHeight";
    pub const ARRAY_WIDTH: &str = "ArrayWidth";
    pub const IFMAP_SRAM: &str = "ifmapsramszkB";
    pub const FILTER_SRAM: &str = "filtersramszkB";
    pub const OFMAP_SRAM: &str = "ofmapsramszkB";
    pub const IFMAP_OFFSET: &str = "IfmapOffset";
    pub const FILTER_OFFSET: &str = "FilterOffset";
    pub const OFMAP_OFFSET: &str = "OfmapOffset";
    pub const DATAFLOW: &str = "Dataflow";
    pub const BANDWIDTH: &str = "Bandwidth";
    pub const MEMORY_BANKS: &str = "MemoryBanks";

    pub const MEMORY_MAP_FILES: &str = "memory_map_files";
    pub const MEMORY_MAP_IFMAP: &str = "MemoryMapIfmap";
    pub const MEMORY_MAP_FILTER: &str = "MemoryMapFilter";
    pub const MEMORY_MAP_OFMAP: &str = "MemoryMapOfmap";

    pub const NETWORK_PRESETS: &str = "network_presets";
    pub const TOPOLOGY_CSV_LOC: &str = "TopologyCsvLoc";
}

impl ScaleConfig {
    /// Creates a configuration from an INI file.
    ///
    /// # Errors
    ///
    /// Any error [`read_conf_file`](Self::read_conf_file) reports.
    pub fn from_conf_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::new();
        config.read_conf_file(path)?;
        Ok(config)
    }

    /// Loads every field from an INI file and marks the configuration valid.
    ///
    /// Validation runs in this order:
    /// 1. `InterfaceBandwidth` must be `USER` or `CALC`; otherwise the load aborts
    ///    before any field is set.
    /// 2. In USER mode, `Bandwidth` must list one value per memory bank.
    /// 3. An unsupported `Dataflow` only logs a warning.
    /// 4. With more than one bank, the ifmap, filter and ofmap map files must exist
    ///    (checked in that order) before the multi-bank map is built.
    /// 5. With one bank, the single-bank map is built from the offsets.
    /// 6. `network_presets` is optional.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving `self` unchanged, if the file cannot be parsed, a key
    /// is missing or malformed, or any of the checks above fails.
    pub fn read_conf_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let doc = Ini::load_from_file_opt(path, options)?;

        let staged = self.stage_from_ini(&doc)?;
        *self = staged;
        info!(path = %path.display(), "loaded configuration");
        Ok(())
    }

    /// Builds the validated successor of `self` from a parsed document.
    fn stage_from_ini(&self, doc: &Ini) -> Result<Self> {
        let run_name = require(doc, keys::GENERAL, keys::RUN_NAME)?.to_string();

        let mode_token = require(doc, keys::RUN_PRESETS, keys::INTERFACE_BANDWIDTH)?;
        let bandwidth_mode = BandwidthMode::from_str(mode_token).inspect_err(|_| {
            error!(token = mode_token, "use either USER or CALC in InterfaceBandwidth, aborting");
        })?;

        let mut staged = self.clone();
        staged.run_name = run_name;
        staged.bandwidth_mode = bandwidth_mode;
        staged.array_rows = require_parsed(doc, keys::ARCHITECTURE, keys::ARRAY_HEIGHT)?;
        staged.array_cols = require_parsed(doc, keys::ARCHITECTURE, keys::ARRAY_WIDTH)?;
        staged.ifmap_sz_kb = require_parsed(doc, keys::ARCHITECTURE, keys::IFMAP_SRAM)?;
        staged.filter_sz_kb = require_parsed(doc, keys::ARCHITECTURE, keys::FILTER_SRAM)?;
        staged.ofmap_sz_kb = require_parsed(doc, keys::ARCHITECTURE, keys::OFMAP_SRAM)?;
        staged.ifmap_offset = require_parsed(doc, keys::ARCHITECTURE, keys::IFMAP_OFFSET)?;
        staged.filter_offset = require_parsed(doc, keys::ARCHITECTURE, keys::FILTER_OFFSET)?;
        staged.ofmap_offset = require_parsed(doc, keys::ARCHITECTURE, keys::OFMAP_OFFSET)?;
        staged.dataflow = Dataflow::from(require(doc, keys::ARCHITECTURE, keys::DATAFLOW)?);
        staged.memory_banks = require_parsed(doc, keys::ARCHITECTURE, keys::MEMORY_BANKS)?;

        if staged.memory_banks == 0 {
            return Err(ConfigError::ZeroMemoryBanks);
        }

        if bandwidth_mode == BandwidthMode::User {
            let raw = require(doc, keys::ARCHITECTURE, keys::BANDWIDTH)?;
            staged.bandwidths = parse_bandwidths(raw)?;
            if staged.bandwidths.len() != staged.memory_banks {
                return Err(ConfigError::BandwidthCountMismatch {
                    banks: staged.memory_banks,
                    bandwidths: staged.bandwidths.len(),
                });
            }
        }

        Self::warn_unsupported_dataflow(&staged.dataflow);

        let mut memory_map = MemoryMap::new();
        if staged.memory_banks > 1 {
            let ifmap = existing_map_file(doc, Tensor::Ifmap, keys::MEMORY_MAP_IFMAP)?;
            let filter = existing_map_file(doc, Tensor::Filter, keys::MEMORY_MAP_FILTER)?;
            let ofmap = existing_map_file(doc, Tensor::Ofmap, keys::MEMORY_MAP_OFMAP)?;
            memory_map.configure(staged.memory_banks, ifmap, filter, ofmap);
        } else {
            memory_map.configure_single_bank(staged.filter_offset, staged.ofmap_offset);
        }
        staged.memory_map = memory_map;

        if doc.section(Some(keys::NETWORK_PRESETS)).is_some() {
            let raw = require(doc, keys::NETWORK_PRESETS, keys::TOPOLOGY_CSV_LOC)?;
            staged.topology_file = strip_quotes(raw).to_string();
        }

        staged.validity = Validity::Valid;
        debug!(
            run_name = %staged.run_name,
            banks = staged.memory_banks,
            mode = %staged.bandwidth_mode,
            "configuration staged"
        );
        Ok(staged)
    }

    /// Writes the configuration as an INI document.
    ///
    /// The bandwidth mode and the memory-map file references are not written, so
    /// reading the output back does not reproduce a multi-bank or USER-mode setup.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotValid`] without touching the filesystem if the configuration
    /// never validated, or an I/O error if the file cannot be written.
    pub fn write_conf_file(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_valid() {
            error!("write_conf_file: no valid config loaded");
            return Err(ConfigError::NotValid);
        }

        let path = path.as_ref();
        self.to_ini().write_to_file_policy(path, EscapePolicy::Nothing)?;
        info!(path = %path.display(), "wrote configuration");
        Ok(())
    }

    /// Builds the document [`write_conf_file`](Self::write_conf_file) emits.
    fn to_ini(&self) -> Ini {
        let mut doc = Ini::new();
        let mut set = |section: &str, key: &str, value: String| {
            doc.set_to(Some(section), key.to_string(), value);
        };

        set(keys::GENERAL, keys::RUN_NAME, self.run_name.clone());

        set(keys::ARCHITECTURE, keys::ARRAY_HEIGHT, self.array_rows.to_string());
        set(keys::ARCHITECTURE, keys::ARRAY_WIDTH, self.array_cols.to_string());
        set(keys::ARCHITECTURE, keys::IFMAP_SRAM, self.ifmap_sz_kb.to_string());
        set(keys::ARCHITECTURE, keys::FILTER_SRAM, self.filter_sz_kb.to_string());
        set(keys::ARCHITECTURE, keys::OFMAP_SRAM, self.ofmap_sz_kb.to_string());
        set(keys::ARCHITECTURE, keys::IFMAP_OFFSET, self.ifmap_offset.to_string());
        set(keys::ARCHITECTURE, keys::FILTER_OFFSET, self.filter_offset.to_string());
        set(keys::ARCHITECTURE, keys::OFMAP_OFFSET, self.ofmap_offset.to_string());
        set(keys::ARCHITECTURE, keys::DATAFLOW, self.dataflow.to_string());
        set(keys::ARCHITECTURE, keys::BANDWIDTH, join_bandwidths(&self.bandwidths));
        set(keys::ARCHITECTURE, keys::MEMORY_BANKS, self.memory_banks.to_string());

        set(
            keys::NETWORK_PRESETS,
            keys::TOPOLOGY_CSV_LOC,
            format!("\"{}\"", self.topology_file),
        );

        doc
    }
}

/// Looks up a required key.
fn require<'a>(doc: &'a Ini, section: &'static str, key: &'static str) -> Result<&'a str> {
    doc.get_from(Some(section), key)
        .ok_or(ConfigError::MissingKey { section, key })
}

/// Looks up a required key and parses its trimmed value.
fn require_parsed<T: FromStr>(doc: &Ini, section: &'static str, key: &'static str) -> Result<T> {
    let raw = require(doc, section, key)?;
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: key,
        value: raw.to_string(),
    })
}

/// Parses a comma-separated bandwidth list, trimming each entry.
fn parse_bandwidths(raw: &str) -> Result<Vec<u64>> {
    raw.trim()
        .split(',')
        .map(|entry| {
            entry.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: keys::BANDWIDTH,
                value: raw.to_string(),
            })
        })
        .collect()
}

/// Reads a memory map file path and checks that it exists.
fn existing_map_file<'a>(doc: &'a Ini, tensor: Tensor, key: &'static str) -> Result<&'a str> {
    let path = require(doc, keys::MEMORY_MAP_FILES, key)?;
    if !Path::new(path).exists() {
        error!(%tensor, path, "memory map file does not exist");
        return Err(ConfigError::MissingMemoryMapFile {
            tensor,
            path: path.into(),
        });
    }
    Ok(path)
}

/// Returns the text between the first pair of `"`, or the trimmed value if unquoted.
fn strip_quotes(raw: &str) -> &str {
    let mut parts = raw.split('"');
    match (parts.next(), parts.next()) {
        (Some(_), Some(inner)) => inner,
        _ => raw.trim(),
    }
}
