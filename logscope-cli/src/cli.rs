//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use logscope_core::TimeLevel;

/// logscope -- browse log files as time-bucketed event counts.
///
/// Use `logscope <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logscope", version, about, long_about = None)]
pub struct Cli {
    /// Path to a logscope.toml configuration file (defaults + env overrides when omitted).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a log file and print bucket counts at one level.
    Summary(SummaryArgs),

    /// Re-read original entries from a log file.
    Entries(EntriesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- summary ----

/// Print bucket counts, total event count and axis range.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Log file to index (`*.xml` is read as an event log export).
    pub file: PathBuf,

    /// Aggregation level (year, month, day, hour, minute, second, millisecond).
    #[arg(long, conflicts_with = "auto_zoom")]
    pub level: Option<TimeLevel>,

    /// Only count buckets inside this timestamp at every coarser level.
    #[arg(long, value_parser = parse_timestamp, requires = "level")]
    pub scope: Option<DateTime<Utc>>,

    /// Skip levels that hold a single bucket (up to `index.auto_zoom_floor`).
    #[arg(long)]
    pub auto_zoom: bool,
}

// ---- entries ----

/// Re-read entries starting at a byte offset or at a bucket.
#[derive(Args, Debug)]
pub struct EntriesArgs {
    /// Log file to read.
    pub file: PathBuf,

    /// Offset recorded in a bucket (byte offset, or line/column code for XML).
    #[arg(long, required_unless_present = "at", conflicts_with = "at")]
    pub offset: Option<u64>,

    /// Representative timestamp of the bucket to read.
    #[arg(long, value_parser = parse_timestamp)]
    pub at: Option<DateTime<Utc>>,

    /// Level of the `--at` bucket.
    #[arg(long, default_value = "millisecond")]
    pub level: TimeLevel,

    /// Scope of the `--at` bucket.
    #[arg(long, value_parser = parse_timestamp, requires = "at")]
    pub scope: Option<DateTime<Utc>>,

    /// Maximum number of entries (default: `index.max_entries`).
    #[arg(long)]
    pub max: Option<usize>,
}

// ---- config ----

/// Manage logscope configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, index).
        section: Option<String>,
    },
}

/// Parse a timestamp argument.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC)
/// and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{s}' (expected RFC 3339 or YYYY-MM-DD[ HH:MM:SS])"))
}
