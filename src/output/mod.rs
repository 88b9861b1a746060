//! Output module
//!
//! Arrow batches and Parquet files for post records.
//!
//! # Overview
//!
//! - `records_to_batch` / `batch_to_records` convert between `PostRecord`s and
//!   Arrow, shaped by a `TableSchema`
//! - `ParquetWriter` and friends write and read snapshot files

mod batch;
mod writer;

pub use batch::{batch_to_records, records_to_batch};
pub use writer::{
    parquet_row_count, read_parquet, write_batches_to_parquet, ParquetWriter, ParquetWriterConfig,
};
