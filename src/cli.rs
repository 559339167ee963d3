//! CLI argument parsing for dxtscan

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for conflict reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "dxtscan")]
#[command(version)]
#[command(about = "Find conflicting parallel I/O in Darshan DXT traces", long_about = None)]
pub struct Cli {
    /// DXT trace produced by darshan-dxt-parser (reads stdin if omitted or "-")
    #[arg(value_name = "TRACE", default_value = "-")]
    pub trace: PathBuf,

    /// Storage block size in bytes for false-sharing detection (1 disables it)
    #[arg(short = 'b', long = "block-size", value_name = "BYTES")]
    pub block_size: Option<u64>,

    /// Number of worker threads scanning files
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Load analysis settings from a TOML file (flags override it)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print per-file, per-rank event counts before the findings
    #[arg(long = "summary")]
    pub summary: bool,

    /// Print every file's events in sweep order before the findings
    #[arg(long = "dump-events")]
    pub dump_events: bool,

    /// Exit with status 1 if any conflict or false sharing is found
    #[arg(long = "fail-on-conflict")]
    pub fail_on_conflict: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
