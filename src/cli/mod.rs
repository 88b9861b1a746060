//! CLI module
//!
//! Command-line interface for the post dump pipeline.
//!
//! # Commands
//!
//! - `run` - Execute the pipeline and print run statistics
//! - `check` - Probe source and destination
//! - `validate` - Validate the effective configuration
//! - `schema` - Print the destination schema
//! - `plan` - Print the ordered stages
//! - `inspect` - Print rows from the destination table

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
