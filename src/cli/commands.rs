//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dump wide-column post rows into a warehouse table
#[derive(Parser, Debug)]
#[command(name = "post-dump")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read, map and load every post row
    Run,

    /// Test that source and destination are reachable
    Check,

    /// Validate the configuration and print it with overrides applied
    Validate,

    /// Show the destination table schema
    Schema,

    /// Show the pipeline stages in execution order
    Plan,

    /// Print rows from the destination table
    Inspect {
        /// Maximum rows to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
