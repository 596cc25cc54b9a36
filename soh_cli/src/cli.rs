//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "soh", version, about = "Battery state-of-health estimator")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/soh_config.toml")]
    pub config: PathBuf,

    /// Emit JSON lines (estimates, summary, errors, logs) instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides `[logging] level`
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the configured ThingSpeak channel and estimate SOH until Ctrl-C
    Bridge {
        /// Stop after this many samples (default: run until interrupted)
        #[arg(long, value_name = "N")]
        max_samples: Option<u64>,
    },
    /// Replay readings from a CSV file with headers voltage,current,temperature
    Replay {
        #[arg(long, value_name = "FILE")]
        csv: PathBuf,
        /// Delay between rows in ms (default: as fast as possible)
        #[arg(long, value_name = "MS", default_value_t = 0)]
        interval_ms: u64,
    },
    /// Feed a deterministic simulated discharge profile
    Simulate {
        /// Number of samples to generate
        #[arg(long, value_name = "N", default_value_t = 50)]
        count: u64,
        /// Delay between samples in ms
        #[arg(long, value_name = "MS", default_value_t = 0)]
        interval_ms: u64,
    },
    /// Load config and artifacts, verify their shapes, and exit
    SelfCheck,
}
