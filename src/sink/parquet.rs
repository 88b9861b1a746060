//! Parquet snapshot sink
//!
//! Each destination table is one file at `<root>/<dataset>/<table>.parquet`.
//! A load writes a temporary file next to the target and renames it into
//! place, so readers see either the old snapshot or the new one.

use super::types::{BulkSink, LoadOptions, LoadSummary};
use crate::decode::PostRecord;
use crate::error::{Error, Result, ResultExt};
use crate::output::{parquet_row_count, records_to_batch, write_batches_to_parquet, ParquetWriterConfig};
use crate::schema::TableSchema;
use crate::types::{CreateDisposition, DestinationTable, WriteDisposition};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Sink that materializes each table as a Parquet file
#[derive(Debug, Clone)]
pub struct ParquetSink {
    root: PathBuf,
    config: ParquetWriterConfig,
}

impl ParquetSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: ParquetWriterConfig::default(),
        }
    }

    /// Compression and row group settings for table files
    #[must_use]
    pub fn with_writer_config(mut self, config: ParquetWriterConfig) -> Self {
        self.config = config;
        self
    }

    /// File backing a destination table
    pub fn table_path(&self, table: &DestinationTable) -> PathBuf {
        self.root
            .join(&table.dataset_id)
            .join(format!("{}.parquet", table.table_id))
    }

    fn load_blocking(
        &self,
        table: &DestinationTable,
        schema: &TableSchema,
        options: LoadOptions,
        records: &[PostRecord],
    ) -> Result<LoadSummary> {
        let path = self.table_path(table);
        let exists = path.is_file();

        if !exists && options.create_disposition == CreateDisposition::CreateNever {
            return Err(Error::TableNotFound {
                table: table.to_string(),
            });
        }

        match options.write_disposition {
            WriteDisposition::WriteTruncate => {}
            WriteDisposition::WriteAppend => {
                return Err(Error::unsupported(
                    "WRITE_APPEND is not supported by the parquet sink",
                ));
            }
            WriteDisposition::WriteEmpty => {
                if exists {
                    let rows = parquet_row_count(&path)?;
                    if rows > 0 {
                        return Err(Error::TableNotEmpty {
                            table: table.to_string(),
                            rows,
                        });
                    }
                }
            }
        }

        let batch = records_to_batch(records, schema)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("parquet.tmp");
        let written = write_batches_to_parquet(
            &staging,
            &schema.to_arrow(),
            &[batch],
            Some(&self.config),
        );
        if let Err(e) = written {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }
        std::fs::rename(&staging, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        tracing::debug!("Wrote {} rows to {}", records.len(), path.display());

        let mut summary = LoadSummary::new(table.clone(), records.len());
        summary.created = !exists;
        summary.replaced = exists;
        Ok(summary)
    }
}

#[async_trait]
impl BulkSink for ParquetSink {
    async fn check(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::connectivity(self.root.display().to_string(), e.to_string())
        })
    }

    async fn load(
        &self,
        table: &DestinationTable,
        schema: &TableSchema,
        options: LoadOptions,
        records: Vec<PostRecord>,
    ) -> Result<LoadSummary> {
        tracing::info!(
            "Loading {} records into {} ({}, {}) under {}",
            records.len(),
            table,
            options.create_disposition,
            options.write_disposition,
            self.root.display()
        );
        let sink = self.clone();
        let table = table.clone();
        let schema = schema.clone();
        tokio::task::spawn_blocking(move || sink.load_blocking(&table, &schema, options, &records))
            .await
            .map_err(|e| Error::Other(format!("parquet load task failed: {e}")))?
    }
}
