//! Sink types and traits

use crate::decode::PostRecord;
use crate::error::Result;
use crate::schema::TableSchema;
use crate::types::{CreateDisposition, DestinationTable, WriteDisposition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Create and write dispositions for one load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadOptions {
    #[serde(default)]
    pub create_disposition: CreateDisposition,
    #[serde(default)]
    pub write_disposition: WriteDisposition,
}

impl LoadOptions {
    /// `CREATE_IF_NEEDED` + `WRITE_TRUNCATE`: a full, idempotent refresh
    pub fn full_refresh() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_create_disposition(mut self, disposition: CreateDisposition) -> Self {
        self.create_disposition = disposition;
        self
    }

    #[must_use]
    pub fn with_write_disposition(mut self, disposition: WriteDisposition) -> Self {
        self.write_disposition = disposition;
        self
    }
}

/// Outcome of a successful load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    pub table: DestinationTable,
    pub records_written: usize,
    /// The table did not exist before this load
    pub created: bool,
    /// Prior contents were discarded
    pub replaced: bool,
    pub loaded_at: DateTime<Utc>,
}

impl LoadSummary {
    pub fn new(table: DestinationTable, records_written: usize) -> Self {
        Self {
            table,
            records_written,
            created: false,
            replaced: false,
            loaded_at: Utc::now(),
        }
    }
}

/// A destination that bulk-loads a complete set of records
///
/// On success the table holds what the dispositions prescribe; for
/// `WRITE_TRUNCATE` that is exactly and only `records`.
#[async_trait]
pub trait BulkSink: Send + Sync {
    /// Verify the destination is reachable
    async fn check(&self) -> Result<()>;

    /// Load records into `table`
    async fn load(
        &self,
        table: &DestinationTable,
        schema: &TableSchema,
        options: LoadOptions,
        records: Vec<PostRecord>,
    ) -> Result<LoadSummary>;
}
