//! Pipeline configuration
//!
//! A run is described by a YAML file with four sections:
//!
//! ```yaml
//! source:
//!   project_id: orbital-heaven-286400
//!   instance_id: around-post
//!   table_id: post
//!   export_path: ./data/post.jsonl
//! destination:
//!   project_id: orbital-heaven-286400
//!   dataset_id: post_analysis
//!   table_id: daily_dump_1
//!   format: warehouse
//!   path: ./data/warehouse.duckdb
//!   compression: snappy
//! load:
//!   create_disposition: create_if_needed
//!   write_disposition: write_truncate
//! run:
//!   parallelism: 4
//!   batch_size: 1000
//! ```
//!
//! `POST_DUMP_*` environment variables override identifiers and paths after
//! the file is read.

use crate::engine::{Pipeline, PipelineStage, RunConfig};
use crate::error::{Error, Result};
use crate::output::ParquetWriterConfig;
use crate::schema::post_schema;
use crate::sink::{BulkSink, LoadOptions, ParquetSink, WarehouseSink};
use crate::source::{ExportRowSource, RowSource};
use crate::types::{DestinationTable, SourceTable};
use once_cell::sync::Lazy;
use parquet::basic::{Compression, ZstdLevel};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

static PROJECT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").unwrap());
static INSTANCE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap());
static TABLE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const PROJECT_RULE: &str = "lowercase letters, digits and hyphens";
const INSTANCE_RULE: &str = "letters, digits, underscores and hyphens, not starting with a digit";
const TABLE_RULE: &str = "letters, digits and underscores, not starting with a digit";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub destination: DestinationConfig,

    /// Load dispositions
    #[serde(default)]
    pub load: LoadOptions,

    /// Parallelism and chunk size
    #[serde(default)]
    pub run: RunConfig,
}

// ============================================================================
// Source and Destination
// ============================================================================

/// Wide-column source table and where its export lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub project_id: String,
    pub instance_id: String,
    pub table_id: String,
    /// JSONL export of the table
    pub export_path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            project_id: "orbital-heaven-286400".to_string(),
            instance_id: "around-post".to_string(),
            table_id: "post".to_string(),
            export_path: PathBuf::from("data/post.jsonl"),
        }
    }
}

/// Destination storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationFormat {
    /// DuckDB database file
    #[default]
    Warehouse,
    /// Parquet file per table under a root directory
    Parquet,
}

/// Codec for Parquet table files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotCompression {
    #[default]
    Snappy,
    Zstd,
    None,
}

impl SnapshotCompression {
    pub fn codec(self) -> Compression {
        match self {
            Self::Snappy => Compression::SNAPPY,
            Self::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Self::None => Compression::UNCOMPRESSED,
        }
    }
}

/// Warehouse destination table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    #[serde(default)]
    pub format: DestinationFormat,
    /// Database file (warehouse) or root directory (parquet)
    pub path: PathBuf,
    /// Parquet only
    #[serde(default)]
    pub compression: SnapshotCompression,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            project_id: "orbital-heaven-286400".to_string(),
            dataset_id: "post_analysis".to_string(),
            table_id: "daily_dump_1".to_string(),
            format: DestinationFormat::Warehouse,
            path: PathBuf::from("data/warehouse.duckdb"),
            compression: SnapshotCompression::default(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl PipelineConfig {
    /// Load from a file, or use defaults when no file is given; then apply
    /// environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a YAML config document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply `POST_DUMP_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply `POST_DUMP_*` overrides from a lookup function
    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let apply = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                tracing::debug!("Config override from {}", key);
                *target = value;
            }
        };
        apply("POST_DUMP_SOURCE_PROJECT", &mut self.source.project_id);
        apply("POST_DUMP_SOURCE_INSTANCE", &mut self.source.instance_id);
        apply("POST_DUMP_SOURCE_TABLE", &mut self.source.table_id);
        apply("POST_DUMP_DEST_PROJECT", &mut self.destination.project_id);
        apply("POST_DUMP_DEST_DATASET", &mut self.destination.dataset_id);
        apply("POST_DUMP_DEST_TABLE", &mut self.destination.table_id);

        if let Some(path) = lookup("POST_DUMP_SOURCE_PATH").filter(|v| !v.is_empty()) {
            self.source.export_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("POST_DUMP_DEST_PATH").filter(|v| !v.is_empty()) {
            self.destination.path = PathBuf::from(path);
        }
    }

    /// Validate identifiers, paths and run settings
    pub fn validate(&self) -> Result<()> {
        let ids = [
            ("source.project_id", &self.source.project_id, &*PROJECT_ID, PROJECT_RULE),
            ("source.instance_id", &self.source.instance_id, &*INSTANCE_ID, INSTANCE_RULE),
            ("source.table_id", &self.source.table_id, &*TABLE_ID, TABLE_RULE),
            ("destination.project_id", &self.destination.project_id, &*PROJECT_ID, PROJECT_RULE),
            ("destination.dataset_id", &self.destination.dataset_id, &*TABLE_ID, TABLE_RULE),
            ("destination.table_id", &self.destination.table_id, &*TABLE_ID, TABLE_RULE),
        ];
        for (field, value, pattern, rule) in ids {
            check_id(field, value, pattern, rule)?;
        }

        if self.source.export_path.as_os_str().is_empty() {
            return Err(Error::missing_field("source.export_path"));
        }
        if self.destination.path.as_os_str().is_empty() {
            return Err(Error::missing_field("destination.path"));
        }

        self.run.validate()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub fn source_table(&self) -> SourceTable {
        SourceTable::new(
            &self.source.project_id,
            &self.source.instance_id,
            &self.source.table_id,
        )
    }

    pub fn destination_table(&self) -> DestinationTable {
        DestinationTable::new(
            &self.destination.project_id,
            &self.destination.dataset_id,
            &self.destination.table_id,
        )
    }

    /// Row source reading the configured export
    pub fn build_source(&self) -> Arc<dyn RowSource> {
        Arc::new(ExportRowSource::new(
            self.source_table(),
            &self.source.export_path,
        ))
    }

    /// Sink for the configured destination format
    ///
    /// Building a sink touches nothing on disk.
    pub fn build_sink(&self) -> Arc<dyn BulkSink> {
        match self.destination.format {
            DestinationFormat::Warehouse => Arc::new(WarehouseSink::new(&self.destination.path)),
            DestinationFormat::Parquet => {
                let writer = ParquetWriterConfig::new()
                    .with_compression(self.destination.compression.codec());
                Arc::new(ParquetSink::new(&self.destination.path).with_writer_config(writer))
            }
        }
    }

    /// Wire source, post mapper and sink into a pipeline
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        self.validate()?;
        Ok(
            Pipeline::new(self.build_source(), self.build_sink(), self.destination_table())
                .with_load_options(self.load)
                .with_config(self.run),
        )
    }

    /// Stages a run would execute, without opening source or destination
    pub fn stages(&self) -> Vec<PipelineStage> {
        PipelineStage::plan(
            &self.source_table(),
            &post_schema(),
            &self.destination_table(),
            self.load,
        )
    }
}

fn check_id(field: &str, value: &str, pattern: &Regex, rule: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::missing_field(field));
    }
    if !pattern.is_match(value) {
        return Err(Error::invalid_value(
            field,
            format!("'{value}' must contain only {rule}"),
        ));
    }
    Ok(())
}
