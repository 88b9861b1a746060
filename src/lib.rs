// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Post Dump
//!
//! Batch export of wide-column post rows into an analytical warehouse table.
//!
//! Each row of the source table becomes one `PostRecord`
//! (`postId`, `user`, `message`, `lat`, `lon`), and the full record set is
//! bulk-loaded into the destination with `CREATE_IF_NEEDED` and
//! `WRITE_TRUNCATE`, so every run leaves an exact snapshot of the source.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use post_dump::config::PipelineConfig;
//!
//! #[tokio::main]
//! async fn main() -> post_dump::Result<()> {
//!     let config = PipelineConfig::from_file("post-dump.yaml")?;
//!     let stats = config.build_pipeline()?.run().await?;
//!     println!("loaded {} records", stats.records_loaded());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐
//! │   source   │ → │   decode   │ → │    sink     │
//! │ RowSource  │   │ RowMapper  │   │  BulkSink   │
//! ├────────────┤   ├────────────┤   ├─────────────┤
//! │ JSONL      │   │ PostMapper │   │ DuckDB      │
//! │ In-memory  │   │ closures   │   │ Parquet     │
//! └────────────┘   └────────────┘   └─────────────┘
//!        read            map        barrier → load
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Source and destination identifiers, load dispositions
pub mod types;

/// Wide-column row sources
pub mod source;

/// Row to `PostRecord` mapping
pub mod decode;

/// Destination table schema
pub mod schema;

/// Arrow/Parquet output
pub mod output;

/// Bulk-load sinks
pub mod sink;

/// Pipeline execution
pub mod engine;

/// Pipeline configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use decode::{map_post, PostMapper, PostRecord, RowMapper};
pub use engine::{Pipeline, RunConfig, RunStats};
pub use schema::post_schema;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
