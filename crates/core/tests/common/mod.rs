//! Shared fixtures for configuration tests.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a thread-local subscriber and returns its result with the log text.
///
/// Every level is captured and ANSI colors are off, so lines read like
/// `WARN sasim_core::config: invalid dataflow, keeping it as given dataflow="xyz"`.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}

/// Log lines emitted at `level`.
pub fn lines_at(logs: &str, level: Level) -> Vec<&str> {
    let tag = level.as_str();
    logs.lines()
        .filter(|line| line.split_whitespace().any(|word| word == tag))
        .collect()
}

/// Path of a sample configuration shipped in the repository's `configs/` directory.
pub fn sample_config(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../configs")
        .join(name)
}

/// Writes `contents` to a fresh temporary file.
pub fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Builder for INI configuration documents.
///
/// Defaults describe a valid 8x8 weight-stationary CALC configuration with one bank
/// and a topology path.
#[derive(Clone, Debug)]
pub struct IniFixture {
    pub run_name: String,
    pub bandwidth_mode: String,
    pub rows: String,
    pub cols: String,
    pub ifmap_kb: String,
    pub filter_kb: String,
    pub ofmap_kb: String,
    pub ifmap_offset: String,
    pub filter_offset: String,
    pub ofmap_offset: String,
    pub dataflow: String,
    pub memory_banks: String,
    pub bandwidth: Option<String>,
    pub map_files: Option<[String; 3]>,
    pub topology: Option<String>,
}

impl Default for IniFixture {
    fn default() -> Self {
        Self {
            run_name: "fixture_run".to_string(),
            bandwidth_mode: "CALC".to_string(),
            rows: "8".to_string(),
            cols: "8".to_string(),
            ifmap_kb: "64".to_string(),
            filter_kb: "64".to_string(),
            ofmap_kb: "32".to_string(),
            ifmap_offset: "0".to_string(),
            filter_offset: "10000000".to_string(),
            ofmap_offset: "20000000".to_string(),
            dataflow: "ws".to_string(),
            memory_banks: "1".to_string(),
            bandwidth: None,
            map_files: None,
            topology: Some("\"topologies/conv_nets/alexnet.csv\"".to_string()),
        }
    }
}

impl IniFixture {
    pub fn with_mode(mut self, mode: &str) -> Self {
        self.bandwidth_mode = mode.to_string();
        self
    }

    pub fn with_banks(mut self, banks: usize) -> Self {
        self.memory_banks = banks.to_string();
        self
    }

    pub fn with_bandwidth(mut self, bandwidth: &str) -> Self {
        self.bandwidth = Some(bandwidth.to_string());
        self
    }

    pub fn with_dataflow(mut self, dataflow: &str) -> Self {
        self.dataflow = dataflow.to_string();
        self
    }

    pub fn with_map_files(mut self, ifmap: &Path, filter: &Path, ofmap: &Path) -> Self {
        self.map_files = Some([
            ifmap.display().to_string(),
            filter.display().to_string(),
            ofmap.display().to_string(),
        ]);
        self
    }

    pub fn without_topology(mut self) -> Self {
        self.topology = None;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("[general]\nrun_name = {}\n\n", self.run_name));
        out.push_str(&format!(
            "[run_presets]\nInterfaceBandwidth = {}\n\n",
            self.bandwidth_mode
        ));
        out.push_str("[architecture_presets]\n");
        out.push_str(&format!("ArrayHeight = {}\n", self.rows));
        out.push_str(&format!("ArrayWidth = {}\n", self.cols));
        out.push_str(&format!("IfmapSramSzkB = {}\n", self.ifmap_kb));
        out.push_str(&format!("FilterSramSzkB = {}\n", self.filter_kb));
        out.push_str(&format!("OfmapSramSzkB = {}\n", self.ofmap_kb));
        out.push_str(&format!("IfmapOffset = {}\n", self.ifmap_offset));
        out.push_str(&format!("FilterOffset = {}\n", self.filter_offset));
        out.push_str(&format!("OfmapOffset = {}\n", self.ofmap_offset));
        out.push_str(&format!("Dataflow = {}\n", self.dataflow));
        out.push_str(&format!("MemoryBanks = {}\n", self.memory_banks));
        if let Some(bandwidth) = &self.bandwidth {
            out.push_str(&format!("Bandwidth = {bandwidth}\n"));
        }
        if let Some([ifmap, filter, ofmap]) = &self.map_files {
            out.push_str("\n[memory_map_files]\n");
            out.push_str(&format!("MemoryMapIfmap = {ifmap}\n"));
            out.push_str(&format!("MemoryMapFilter = {filter}\n"));
            out.push_str(&format!("MemoryMapOfmap = {ofmap}\n"));
        }
        if let Some(topology) = &self.topology {
            out.push_str(&format!("\n[network_presets]\nTopologyCsvLoc = {topology}\n"));
        }
        out
    }

    pub fn write(&self) -> NamedTempFile {
        write_temp(&self.render())
    }
}
