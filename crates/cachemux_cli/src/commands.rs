use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use cachemux_core::models::ProbeStrategy;

pub const DEFAULT_CONFIG_FILE: &str = "cachemux.toml";

#[derive(Debug, Parser)]
#[command(name = "cachemux")]
#[command(version, about = "Recover playable media from cached stream fragments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Trim, classify, pair and remux every group under the input root
    Run(RunArgs),
    /// Write a default configuration file
    InitConfig {
        /// Configuration file to write
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    PrintConfig {
        /// Configuration file to read
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory holding one subdirectory per cached item
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory receiving the muxed files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of groups processed in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Stream inspection strategy
    #[arg(long, value_enum)]
    pub probe: Option<ProbeArg>,

    /// Hardware acceleration hint passed to ffmpeg (e.g. cuda, vaapi)
    #[arg(long)]
    pub hwaccel: Option<String>,

    /// Timeout per external tool call, in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Keep trimmed fragments of groups that did not complete
    #[arg(long)]
    pub keep_temp: bool,

    /// Let later groups overwrite outputs with the same name
    #[arg(long)]
    pub overwrite: bool,

    /// Write one log file per group
    #[arg(long)]
    pub group_logs: bool,

    /// Write the per-group outcomes as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProbeArg {
    Structured,
    TextScan,
}

impl From<ProbeArg> for ProbeStrategy {
    fn from(arg: ProbeArg) -> Self {
        match arg {
            ProbeArg::Structured => ProbeStrategy::Structured,
            ProbeArg::TextScan => ProbeStrategy::TextScan,
        }
    }
}
