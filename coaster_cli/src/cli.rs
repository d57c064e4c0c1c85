//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "coaster", version, about = "Smart coaster firmware host")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/coaster.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level,
    /// RUST_LOG overrides both
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop with stdin/stdout as the command link
    Run {
        /// Stop after this many ticks (default: until stdin closes or Ctrl-C)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Replay weights (grams, one per line) instead of reading a scale
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,
    },
    /// Validate config and scale bring-up, then print `ok`
    SelfCheck,
}
