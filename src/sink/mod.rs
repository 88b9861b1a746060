//! Sink module
//!
//! Bulk destinations for mapped post records.
//!
//! # Overview
//!
//! - `BulkSink` loads a complete record set under create/write dispositions
//! - `WarehouseSink` loads into DuckDB, one transaction per load
//! - `ParquetSink` materializes each table as a Parquet snapshot

mod parquet;
mod types;
mod warehouse;

pub use parquet::ParquetSink;
pub use types::{BulkSink, LoadOptions, LoadSummary};
pub use warehouse::WarehouseSink;
