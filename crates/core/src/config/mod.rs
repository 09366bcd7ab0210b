//! Configuration model for the systolic-array simulator.
//!
//! This module defines the architectural description shared by every simulation
//! component. It provides:
//! 1. **Defaults:** Baseline array, scratchpad, and address-offset constants.
//! 2. **Enums:** Dataflow strategy, bandwidth mode, and the validity state.
//! 3. **Gate:** Guarded accessors that return `None` until the configuration validates.
//! 4. **Setters:** Ad-hoc programmatic configuration.
//!
//! Loading and exporting live in the submodules: [`file`] (INI documents) and
//! [`list`] (positional value lists).

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use tracing::{error, warn};

use crate::common::{ConfigError, Result};
use crate::memory::MemoryMap;

/// INI document loading and writing.
pub mod file;
/// Positional list loading and exporting.
pub mod list;

pub use list::{ConfListValue, ConfRecord};

/// Default configuration constants.
///
/// These values describe the configuration before any load path has run.
mod defaults {
    /// Run identifier.
    pub const RUN_NAME: &str = "scale_run";

    /// Systolic array height (PE rows).
    pub const ARRAY_ROWS: usize = 4;

    /// Systolic array width (PE columns).
    pub const ARRAY_COLS: usize = 4;

    /// Ifmap scratchpad capacity in KB.
    pub const IFMAP_SRAM_KB: usize = 256;

    /// Filter scratchpad capacity in KB.
    pub const FILTER_SRAM_KB: usize = 256;

    /// Ofmap scratchpad capacity in KB.
    pub const OFMAP_SRAM_KB: usize = 128;

    /// Ifmap base address.
    pub const IFMAP_OFFSET: u64 = 0;

    /// Filter base address.
    ///
    /// Leaves ten million words for the ifmap before the filter region starts.
    pub const FILTER_OFFSET: u64 = 10_000_000;

    /// Ofmap base address.
    pub const OFMAP_OFFSET: u64 = 20_000_000;

    /// DRAM bank count.
    pub const MEMORY_BANKS: usize = 1;
}

/// Dataflow strategy: which operand stays resident in the PEs.
///
/// Parsing never fails. Tokens other than `os`, `ws` and `is` are kept verbatim in
/// [`Dataflow::Other`] so that a loader can warn about them and continue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Dataflow {
    /// Output stationary (`os`).
    OutputStationary,
    /// Weight stationary (`ws`).
    #[default]
    WeightStationary,
    /// Input stationary (`is`).
    InputStationary,
    /// Unrecognised token, kept as written.
    Other(String),
}

impl Dataflow {
    /// Returns the token as it appears in configuration files.
    pub fn as_str(&self) -> &str {
        match self {
            Self::OutputStationary => "os",
            Self::WeightStationary => "ws",
            Self::InputStationary => "is",
            Self::Other(token) => token,
        }
    }

    /// Returns `true` for `os`, `ws` and `is`.
    #[inline]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for Dataflow {
    fn from(token: &str) -> Self {
        match token {
            "os" => Self::OutputStationary,
            "ws" => Self::WeightStationary,
            "is" => Self::InputStationary,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Dataflow {
    fn from(token: String) -> Self {
        Self::from(token.as_str())
    }
}

impl FromStr for Dataflow {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Dataflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Dataflow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where per-bank DRAM bandwidth comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BandwidthMode {
    /// Supplied by the user, one value per bank (`USER`).
    User,
    /// Computed by the simulator (`CALC`).
    #[default]
    Calc,
}

impl FromStr for BandwidthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USER" => Ok(Self::User),
            "CALC" => Ok(Self::Calc),
            other => Err(ConfigError::InvalidBandwidthMode(other.to_string())),
        }
    }
}

impl fmt::Display for BandwidthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("USER"),
            Self::Calc => f.write_str("CALC"),
        }
    }
}

/// Validity gate of a [`ScaleConfig`].
///
/// The only transition is `Unvalidated -> Valid`, taken by a completed load path,
/// [`ScaleConfig::force_valid`], or the offset setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validity {
    /// No load path has completed.
    #[default]
    Unvalidated,
    /// Fields may be read and exported.
    Valid,
}

/// Systolic-array simulator configuration.
///
/// Produced by [`read_conf_file`](Self::read_conf_file),
/// [`update_from_list`](Self::update_from_list), or the setters; consumed through the
/// guarded `get_*` accessors and the two exporters.
///
/// # Examples
///
/// ```
/// use sasim_core::ScaleConfig;
///
/// let mut config = ScaleConfig::new();
/// assert_eq!(config.get_array_dims(), None);
///
/// config.force_valid();
/// assert_eq!(config.get_array_dims(), Some((4, 4)));
/// assert_eq!(config.get_dataflow().map(ToString::to_string).as_deref(), Some("ws"));
/// ```
#[derive(Debug, Clone)]
pub struct ScaleConfig {
    pub(crate) run_name: String,
    pub(crate) array_rows: usize,
    pub(crate) array_cols: usize,
    pub(crate) ifmap_sz_kb: usize,
    pub(crate) filter_sz_kb: usize,
    pub(crate) ofmap_sz_kb: usize,
    pub(crate) ifmap_offset: u64,
    pub(crate) filter_offset: u64,
    pub(crate) ofmap_offset: u64,
    pub(crate) dataflow: Dataflow,
    pub(crate) bandwidth_mode: BandwidthMode,
    pub(crate) bandwidths: Vec<u64>,
    pub(crate) memory_banks: usize,
    pub(crate) memory_map: MemoryMap,
    pub(crate) topology_file: String,
    pub(crate) validity: Validity,
}

impl ScaleConfig {
    /// Creates an unvalidated configuration holding the defaults.
    pub fn new() -> Self {
        Self {
            run_name: defaults::RUN_NAME.to_string(),
            array_rows: defaults::ARRAY_ROWS,
            array_cols: defaults::ARRAY_COLS,
            ifmap_sz_kb: defaults::IFMAP_SRAM_KB,
            filter_sz_kb: defaults::FILTER_SRAM_KB,
            ofmap_sz_kb: defaults::OFMAP_SRAM_KB,
            ifmap_offset: defaults::IFMAP_OFFSET,
            filter_offset: defaults::FILTER_OFFSET,
            ofmap_offset: defaults::OFMAP_OFFSET,
            dataflow: Dataflow::default(),
            bandwidth_mode: BandwidthMode::default(),
            bandwidths: Vec::new(),
            memory_banks: defaults::MEMORY_BANKS,
            memory_map: MemoryMap::new(),
            topology_file: String::new(),
            validity: Validity::Unvalidated,
        }
    }

    /// Runs `read` if the configuration is valid; otherwise logs and returns `None`.
    pub(crate) fn guarded<'a, T>(
        &'a self,
        accessor: &'static str,
        read: impl FnOnce(&'a Self) -> T,
    ) -> Option<T> {
        match self.validity {
            Validity::Valid => Some(read(self)),
            Validity::Unvalidated => {
                error!(accessor, "configuration is not valid, not returning any value");
                None
            }
        }
    }

    /// Logs a warning when the dataflow token is not one of `os`, `ws`, `is`.
    pub(crate) fn warn_unsupported_dataflow(dataflow: &Dataflow) {
        if !dataflow.is_supported() {
            warn!(dataflow = dataflow.as_str(), "invalid dataflow, keeping it as given");
        }
    }

    // ── Gate ────────────────────────────────────────────────

    /// Current validity state. Not gated.
    #[inline]
    pub const fn validity(&self) -> Validity {
        self.validity
    }

    /// Returns `true` once a load path has completed. Not gated.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// Marks the configuration valid without any consistency check.
    pub const fn force_valid(&mut self) {
        self.validity = Validity::Valid;
    }

    // ── Setters ─────────────────────────────────────────────

    /// Sets the systolic array dimensions.
    pub const fn set_arr_dims(&mut self, rows: usize, cols: usize) {
        self.array_rows = rows;
        self.array_cols = cols;
    }

    /// Sets the dataflow; unsupported tokens are stored as given.
    pub fn set_dataflow(&mut self, dataflow: impl Into<Dataflow>) {
        self.dataflow = dataflow.into();
    }

    /// Sets the ifmap, filter and ofmap scratchpad sizes in KB.
    pub const fn set_buffer_sizes_kb(
        &mut self,
        ifmap_size_kb: usize,
        filter_size_kb: usize,
        ofmap_size_kb: usize,
    ) {
        self.ifmap_sz_kb = ifmap_size_kb;
        self.filter_sz_kb = filter_size_kb;
        self.ofmap_sz_kb = ofmap_size_kb;
    }

    /// Sets the topology file path.
    pub fn set_topology_file(&mut self, topology_file: impl Into<String>) {
        self.topology_file = topology_file.into();
    }

    /// Sets the address offsets with the legacy assignment order, and forces validity.
    ///
    /// The ifmap offset receives `ofmap_offset` and the ofmap offset is left unchanged.
    /// Callers that need each offset stored in its own field should use
    /// [`set_address_offsets`](Self::set_address_offsets).
    pub const fn set_offsets(&mut self, ifmap_offset: u64, filter_offset: u64, ofmap_offset: u64) {
        self.ifmap_offset = ifmap_offset;
        self.filter_offset = filter_offset;
        // Legacy ordering: the third argument lands on the ifmap field.
        self.ifmap_offset = ofmap_offset;
        self.validity = Validity::Valid;
    }

    /// Sets the ifmap, filter and ofmap offsets each to its own field, and forces validity.
    pub const fn set_address_offsets(&mut self, ifmap_offset: u64, filter_offset: u64, ofmap_offset: u64) {
        self.ifmap_offset = ifmap_offset;
        self.filter_offset = filter_offset;
        self.ofmap_offset = ofmap_offset;
        self.validity = Validity::Valid;
    }

    /// Switches to simulator-computed bandwidth.
    pub const fn set_bw_mode_to_calc(&mut self) {
        self.bandwidth_mode = BandwidthMode::Calc;
    }

    // ── Guarded accessors ───────────────────────────────────

    /// Run identifier.
    pub fn get_run_name(&self) -> Option<&str> {
        self.guarded("get_run_name", |c| c.run_name.as_str())
    }

    /// Topology file path, possibly empty.
    pub fn get_topology_path(&self) -> Option<&str> {
        self.guarded("get_topology_path", |c| c.topology_file.as_str())
    }

    /// Bare topology name: the last path segment, cut at its first `.`.
    ///
    /// `topologies/conv_nets/alexnet.csv` yields `alexnet`.
    pub fn get_topology_name(&self) -> Option<String> {
        self.guarded("get_topology_name", |c| {
            let file_name = c.topology_file.rsplit('/').next().unwrap_or_default().trim();
            file_name.split('.').next().unwrap_or_default().to_string()
        })
    }

    /// Dataflow strategy, verbatim if unsupported.
    pub fn get_dataflow(&self) -> Option<&Dataflow> {
        self.guarded("get_dataflow", |c| &c.dataflow)
    }

    /// Array `(rows, cols)`.
    pub fn get_array_dims(&self) -> Option<(usize, usize)> {
        self.guarded("get_array_dims", |c| (c.array_rows, c.array_cols))
    }

    /// Scratchpad sizes `(ifmap, filter, ofmap)` in KB.
    pub fn get_mem_sizes(&self) -> Option<(usize, usize, usize)> {
        self.guarded("get_mem_sizes", |c| {
            (c.ifmap_sz_kb, c.filter_sz_kb, c.ofmap_sz_kb)
        })
    }

    /// Address offsets `(ifmap, filter, ofmap)`.
    pub fn get_offsets(&self) -> Option<(u64, u64, u64)> {
        self.guarded("get_offsets", |c| {
            (c.ifmap_offset, c.filter_offset, c.ofmap_offset)
        })
    }

    /// Bandwidths joined with `,`; empty when none were supplied.
    pub fn get_bandwidths_as_string(&self) -> Option<String> {
        self.guarded("get_bandwidths_as_string", |c| join_bandwidths(&c.bandwidths))
    }

    /// Per-bank bandwidths.
    pub fn get_bandwidths_as_list(&self) -> Option<&[u64]> {
        self.guarded("get_bandwidths_as_list", |c| c.bandwidths.as_slice())
    }

    /// Bandwidth mode.
    pub fn get_bandwidth_mode(&self) -> Option<BandwidthMode> {
        self.guarded("get_bandwidth_mode", |c| c.bandwidth_mode)
    }

    /// Whether the simulator may use the user-supplied DRAM bandwidths.
    pub fn use_user_dram_bandwidth(&self) -> Option<bool> {
        self.guarded("use_user_dram_bandwidth", |c| {
            c.bandwidth_mode == BandwidthMode::User
        })
    }

    /// Smallest user-supplied bank bandwidth.
    ///
    /// Only defined in USER mode; in CALC mode the bandwidth is computed outside this
    /// library and the call logs an error and returns `None`.
    pub fn get_min_dram_bandwidth(&self) -> Option<u64> {
        self.guarded("get_min_dram_bandwidth", |c| match c.bandwidth_mode {
            BandwidthMode::User => c.bandwidths.iter().min().copied(),
            BandwidthMode::Calc => {
                error!("get_min_dram_bandwidth: no user bandwidth provided");
                None
            }
        })
        .flatten()
    }

    /// DRAM bank count.
    pub fn get_memory_banks(&self) -> Option<usize> {
        self.guarded("get_memory_banks", |c| c.memory_banks)
    }

    /// Memory map built by the last load path.
    pub fn get_memory_map(&self) -> Option<&MemoryMap> {
        self.guarded("get_memory_map", |c| &c.memory_map)
    }

    /// Serializable view of every field.
    pub fn snapshot(&self) -> Option<ConfigSnapshot> {
        self.guarded("snapshot", |c| ConfigSnapshot {
            run_name: c.run_name.clone(),
            array_rows: c.array_rows,
            array_cols: c.array_cols,
            ifmap_sz_kb: c.ifmap_sz_kb,
            filter_sz_kb: c.filter_sz_kb,
            ofmap_sz_kb: c.ofmap_sz_kb,
            ifmap_offset: c.ifmap_offset,
            filter_offset: c.filter_offset,
            ofmap_offset: c.ofmap_offset,
            dataflow: c.dataflow.clone(),
            bandwidth_mode: c.bandwidth_mode,
            bandwidths: c.bandwidths.clone(),
            memory_banks: c.memory_banks,
            topology_file: c.topology_file.clone(),
        })
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins bandwidths with `,` and no padding.
pub(crate) fn join_bandwidths(bandwidths: &[u64]) -> String {
    bandwidths
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Plain-data view of a validated [`ScaleConfig`].
///
/// The memory map is omitted; it has no serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    /// Run identifier.
    pub run_name: String,
    /// Array height.
    pub array_rows: usize,
    /// Array width.
    pub array_cols: usize,
    /// Ifmap scratchpad size in KB.
    pub ifmap_sz_kb: usize,
    /// Filter scratchpad size in KB.
    pub filter_sz_kb: usize,
    /// Ofmap scratchpad size in KB.
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
    /// Per-bank bandwidths.
    pub bandwidths: Vec<u64>,
    /// DRAM bank count.
    pub memory_banks: usize,
    /// Topology file path.
    pub topology_file: String,
}

impl ConfigSnapshot {
    /// Renders the snapshot as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
