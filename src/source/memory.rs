//! In-memory row source

use super::types::{RowSource, RowStream, SourceRow};
use crate::error::Result;
use crate::types::SourceTable;
use async_trait::async_trait;

/// A wide-column table held in memory
///
/// Each scan clones the current rows, so a scan observes the table as it was
/// when `scan` was called.
#[derive(Debug, Clone)]
pub struct MemoryRowSource {
    table: SourceTable,
    rows: Vec<SourceRow>,
}

impl MemoryRowSource {
    /// Create an empty table
    pub fn new(table: SourceTable) -> Self {
        Self {
            table,
            rows: Vec::new(),
        }
    }

    /// Create a table with rows
    pub fn with_rows(table: SourceTable, rows: Vec<SourceRow>) -> Self {
        Self { table, rows }
    }

    pub fn push(&mut self, row: SourceRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl RowSource for MemoryRowSource {
    fn table(&self) -> &SourceTable {
        &self.table
    }

    async fn check(&self) -> Result<()> {
        Ok(())
    }

    async fn scan(&self) -> Result<RowStream> {
        tracing::debug!("Scanning {} in-memory rows from {}", self.rows.len(), self.table);
        let rows: Vec<Result<SourceRow>> = self.rows.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(rows)))
    }
}
