//! Row source module
//!
//! Scans a wide-column table and yields one `SourceRow` per record.
//!
//! # Overview
//!
//! The table client itself is an external collaborator. This module defines
//! the `RowSource` scan contract and ships two implementations:
//! - `MemoryRowSource` - rows held in memory
//! - `ExportRowSource` - a JSONL snapshot exported from the table

mod export;
mod memory;
mod types;

pub use export::{export_line, parse_export_line, write_export, CellEncoding, ExportRowSource};
pub use memory::MemoryRowSource;
pub use types::{Family, RowSource, RowStream, SourceRow};
