//! Execution engine module
//!
//! Read, map and load orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Pipeline` - A source, a mapper and a sink wired into ordered stages
//! - `RunConfig` - Parallelism and chunk size for a run
//! - `RunStats` - What a completed run read and loaded
//!
//! Every row is mapped before the sink is called, so a record error aborts
//! the run with the destination untouched.

mod types;

pub use types::{PipelineStage, RunConfig, RunStats};

use crate::decode::{PostMapper, PostRecord, RowMapper};
use crate::error::{Error, Result};
use crate::schema::{post_schema, TableSchema};
use crate::sink::{BulkSink, LoadOptions};
use crate::source::{RowSource, SourceRow};
use crate::types::DestinationTable;
use futures::{TryFutureExt, TryStreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A post dump pipeline
pub struct Pipeline {
    source: Arc<dyn RowSource>,
    mapper: Arc<dyn RowMapper>,
    sink: Arc<dyn BulkSink>,
    destination: DestinationTable,
    schema: TableSchema,
    options: LoadOptions,
    config: RunConfig,
}

impl Pipeline {
    /// Create a pipeline with the post mapper, post schema and a full refresh
    pub fn new(
        source: Arc<dyn RowSource>,
        sink: Arc<dyn BulkSink>,
        destination: DestinationTable,
    ) -> Self {
        Self {
            source,
            mapper: Arc::new(PostMapper::new()),
            sink,
            destination,
            schema: post_schema(),
            options: LoadOptions::default(),
            config: RunConfig::default(),
        }
    }

    /// Replace the row mapper
    #[must_use]
    pub fn with_mapper(mut self, mapper: Arc<dyn RowMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    /// Set load dispositions
    #[must_use]
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Set run configuration
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn destination(&self) -> &DestinationTable {
        &self.destination
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The stages a run executes, in order
    pub fn stages(&self) -> Vec<PipelineStage> {
        PipelineStage::plan(
            self.source.table(),
            &self.schema,
            &self.destination,
            self.options,
        )
    }

    /// Probe source and destination
    pub async fn check(&self) -> Result<()> {
        self.source.check().await?;
        tracing::info!("Source {} is reachable", self.source.table());
        self.sink.check().await?;
        tracing::info!("Destination for {} is reachable", self.destination);
        Ok(())
    }

    /// Read every row, map it, and load the full record set
    pub async fn run(&self) -> Result<RunStats> {
        self.config.validate()?;
        let start = Instant::now();

        tracing::info!("Reading {}", self.source.table());
        let rows = self.source.scan().await?;

        let rows_read = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&rows_read);
        let mapper = Arc::clone(&self.mapper);

        let chunks: Vec<Vec<PostRecord>> = rows
            .try_chunks(self.config.batch_size)
            .map_err(|e| e.1)
            .map_ok(move |chunk| {
                counter.fetch_add(chunk.len(), Ordering::Relaxed);
                map_chunk(Arc::clone(&mapper), chunk)
            })
            .try_buffer_unordered(self.config.parallelism)
            .try_collect()
            .await?;

        let rows_read = rows_read.load(Ordering::Relaxed);
        let chunk_count = chunks.len();
        let records: Vec<PostRecord> = chunks.into_iter().flatten().collect();
        tracing::info!(
            "Mapped {} rows into {} records ({} chunks)",
            rows_read,
            records.len(),
            chunk_count
        );

        let load = self
            .sink
            .load(&self.destination, &self.schema, self.options, records)
            .await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Loaded {} records into {} in {}ms",
            load.records_written,
            load.table,
            duration_ms
        );

        Ok(RunStats {
            rows_read,
            chunks: chunk_count,
            duration_ms,
            load,
        })
    }
}

/// Map one chunk on the blocking pool
fn map_chunk(
    mapper: Arc<dyn RowMapper>,
    chunk: Vec<SourceRow>,
) -> impl std::future::Future<Output = Result<Vec<PostRecord>>> + Send {
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Mapping chunk of {} rows", chunk.len());
        chunk.iter().map(|row| mapper.map(row)).collect::<Result<Vec<_>>>()
    })
    .map_err(|e| Error::Other(format!("mapping task failed: {e}")))
    .and_then(futures::future::ready)
}

#[cfg(test)]
mod tests;
