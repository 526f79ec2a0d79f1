//! Command-line interface definitions for appsync.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, config file, store location) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan install roots and print the inventory
//! appsync scan
//!
//! # Enrich everything still missing a description, as JSON
//! appsync enrich --output json
//!
//! # Describe one bundle without touching Finder comments
//! appsync describe /Applications/Safari.app --dry-run
//!
//! # Verbose mode for debugging
//! appsync -v enrich --limit 5
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// Application inventory sync.
///
/// appsync scans installed application bundles, enriches them with generated
/// multi-language descriptions, categories and function tags, and keeps the
/// results in a durable record store and a searchable index.
#[derive(Debug, Parser)]
#[command(name = "appsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Plain progress output without animation
    #[arg(long, global = true, env = "APPSYNC_ACCESSIBLE")]
    pub accessible: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Config file (defaults to the platform config dir)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Record store file
    #[arg(long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Override the system language (two-letter code)
    #[arg(long, value_name = "CODE", global = true)]
    pub language: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The configuration layer contributed by command-line flags.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let inter_item_delay_ms = match &self.command {
            Commands::Enrich(args) => args.delay_ms,
            _ => None,
        };
        ConfigOverrides {
            store_path: self.store.clone(),
            language: self.language.clone(),
            inter_item_delay_ms,
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan install roots, merge with stored records and print the inventory
    Scan(ScanArgs),
    /// Enrich entries with generated descriptions, categories and tags
    Enrich(EnrichArgs),
    /// Enrich a single application bundle
    Describe(DescribeArgs),
    /// Search stored records
    Search(SearchArgs),
    /// Show inventory and store statistics
    Stats(StatsArgs),
    /// Rescan and drop records for bundles that no longer exist
    Prune,
    /// Delete the record store and the search index
    Clear(ClearArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Skip icon loading
    #[arg(long)]
    pub fast: bool,

    /// Which entries to print
    #[arg(long, value_enum, default_value = "all")]
    pub filter: FilterArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Do not write the scanned entries to the record store
    #[arg(long)]
    pub no_save: bool,
}

/// Arguments for the enrich subcommand.
#[derive(Debug, Args)]
pub struct EnrichArgs {
    /// Visit every entry, not just those missing a description
    #[arg(long)]
    pub all: bool,

    /// Stop after this many entries
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Pause between entries in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Leave Finder comments untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for the summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the describe subcommand.
#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Application bundle to describe
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Leave the Finder comment untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the search subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive text to look for
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the stats subcommand.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the clear subcommand.
#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Confirm deletion of all stored data
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Also write the effective configuration to the config file
    #[arg(long)]
    pub write: bool,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored human-readable text
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Entry filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    All,
    /// Entries with a comment or any stored description
    WithDescription,
    WithoutDescription,
}
