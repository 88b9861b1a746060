//! Engine types
//!
//! Run settings, stage descriptions and run statistics.

use crate::error::{Error, Result};
use crate::schema::TableSchema;
use crate::sink::{LoadOptions, LoadSummary};
use crate::types::{DestinationTable, SourceTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settings for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Chunks mapped concurrently
    pub parallelism: usize,
    /// Rows per mapping chunk
    pub batch_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism().map_or(4, usize::from),
            batch_size: 1000,
        }
    }
}

impl RunConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::invalid_value("run.parallelism", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_value("run.batch_size", "must be greater than 0"));
        }
        Ok(())
    }
}

/// One step of the pipeline, in execution order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum PipelineStage {
    /// Scan every row of the source table
    Read { source: SourceTable },
    /// Map each row to a record with these columns
    Map { columns: Vec<String> },
    /// Bulk-load all records into the destination
    Load {
        destination: DestinationTable,
        options: LoadOptions,
    },
}

impl PipelineStage {
    /// Stages of a run from `source` into `destination`
    pub fn plan(
        source: &SourceTable,
        schema: &TableSchema,
        destination: &DestinationTable,
        options: LoadOptions,
    ) -> Vec<Self> {
        vec![
            Self::Read {
                source: source.clone(),
            },
            Self::Map {
                columns: schema.names().into_iter().map(String::from).collect(),
            },
            Self::Load {
                destination: destination.clone(),
                options,
            },
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Map { .. } => "map",
            Self::Load { .. } => "load",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { source } => write!(f, "read  {source}"),
            Self::Map { columns } => write!(f, "map   ({})", columns.join(", ")),
            Self::Load {
                destination,
                options,
            } => write!(
                f,
                "load  {destination} ({}, {})",
                options.create_disposition, options.write_disposition
            ),
        }
    }
}

/// Statistics from a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Rows scanned from the source
    pub rows_read: usize,
    /// Mapping chunks processed
    pub chunks: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Result of the load
    pub load: LoadSummary,
}

impl RunStats {
    /// Records written by the load
    pub fn records_loaded(&self) -> usize {
        self.load.records_written
    }
}
