//! Systolic-array simulator configuration CLI.
//!
//! This binary exposes the configuration model from the command line. It supports:
//! 1. **Show:** Load an INI configuration and print its list export or JSON snapshot.
//! 2. **Convert:** Load an INI configuration and write it back in canonical form.
//! 3. **Defaults:** Print the default configuration as a list, without loading anything.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use sasim_core::{ConfigError, Result, ScaleConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sasim",
    author,
    version,
    about = "Systolic-array simulator configuration tool",
    long_about = "Inspect, convert, and list systolic-array simulator configurations.\n\nExamples:\n  sasim show configs/scale.cfg\n  sasim show configs/google.cfg --json\n  sasim convert configs/scale.cfg out.cfg\n  sasim defaults"
)]
struct Cli {
    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a configuration file and print its contents.
    Show {
        /// INI configuration file (e.g. configs/scale.cfg).
        config: PathBuf,

        /// Print the JSON snapshot instead of the positional list.
        #[arg(long)]
        json: bool,
    },

    /// Load a configuration file and write it back out.
    Convert {
        /// Source INI configuration.
        input: PathBuf,

        /// Destination file; overwritten if present.
        output: PathBuf,
    },

    /// Print the default configuration as a positional list.
    Defaults,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Show { config, json } => cmd_show(&config, json),
        Commands::Convert { input, output } => cmd_convert(&input, &output),
        Commands::Defaults => {
            cmd_defaults();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Installs the fmt subscriber, honoring `RUST_LOG` before the verbosity flag.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `path` and prints the list export, or the JSON snapshot with `json`.
///
/// A header line carries the topology name and bandwidth mode in list mode.
fn cmd_show(path: &Path, json: bool) -> Result<()> {
    let config = ScaleConfig::from_conf_file(path)?;

    if json {
        let snapshot = config.snapshot().ok_or(ConfigError::NotValid)?;
        println!("{}", snapshot.to_json_pretty()?);
        return Ok(());
    }

    let topology = config.get_topology_name().unwrap_or_default();
    let mode = config.get_bandwidth_mode().ok_or(ConfigError::NotValid)?;
    println!("Topology: {topology}  Bandwidth mode: {mode}");

    let list = config.get_conf_as_list().ok_or(ConfigError::NotValid)?;
    for (index, entry) in list.iter().enumerate() {
        println!("  [{index:2}] {entry}");
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: &Path) -> Result<()> {
    let config = ScaleConfig::from_conf_file(input)?;
    config.write_conf_file(output)?;
    debug!(input = %input.display(), output = %output.display(), "configuration converted");
    println!("Wrote {}", output.display());
    Ok(())
}

fn cmd_defaults() {
    for (index, entry) in ScaleConfig::get_default_conf_as_list().iter().enumerate() {
        println!("  [{index:2}] {entry}");
    }
}
