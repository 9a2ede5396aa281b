//! CLI parse: clap types for labplan. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Labplan CLI - experiment batch plans for ELN uploads
#[derive(Parser)]
#[command(name = "labplan")]
#[command(about = "Expand experiment batch plans into sample, batch and process records")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the plan's pending phases and save the plan back
    Execute {
        /// Plan archive file, relative to the upload root
        plan: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the materialized processes without writing anything
    Expand {
        /// Plan archive file, relative to the upload root
        plan: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Rebuild the batch summary from already materialized processes
    Summary {
        /// Plan archive file, relative to the upload root
        plan: String,
    },
    /// Parse an instrument file into a measurement record
    Parse {
        /// Instrument format (pl, dta, labview)
        kind: String,
        /// File to parse
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Fill a stored potentiostat measurement from its `.DTA` data file
    Normalize {
        /// Measurement archive file, relative to the upload root
        measurement: String,
    },
    /// List section definitions or show one definition's fields
    Schema {
        /// Section definition name
        #[arg(long)]
        section: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
