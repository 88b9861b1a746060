//! Error types for post-dump
//!
//! Every stage of the pipeline returns `Result<T, Error>`. Record-level errors
//! (`Decode`, `Format`) abort the whole run; there is no per-record skip.

use thiserror::Error;

/// The main error type for post-dump
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Cannot reach {target}: {message}")]
    Connectivity { target: String, message: String },

    #[error("Source scan failed: {message}")]
    Scan { message: String },

    // ============================================================================
    // Record Errors
    // ============================================================================
    #[error("Failed to decode row '{row_key}': {message}")]
    Decode { row_key: String, message: String },

    #[error("Row '{row_key}': column {column} value '{value}' is not a number: {message}")]
    Format {
        row_key: String,
        column: String,
        value: String,
        message: String,
    },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    #[error("Destination table {table} does not exist")]
    TableNotFound { table: String },

    #[error("Destination table {table} is not empty ({rows} rows)")]
    TableNotEmpty { table: String, rows: usize },

    #[error("Schema mismatch for {table}: {message}")]
    SchemaMismatch { table: String, message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("Load failed: {message}")]
    Sink { message: String },

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] duckdb::Error),

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a connectivity error
    pub fn connectivity(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connectivity {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a scan error
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(row_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            row_key: row_key.into(),
            message: message.into(),
        }
    }

    /// Create a number format error
    pub fn format(
        row_key: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Format {
            row_key: row_key.into(),
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Only connectivity failures are worth retrying. A retried run starts a
    /// fresh scan and a fresh truncate-and-load.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connectivity { .. })
    }

    /// Check if this error was caused by the content of a source row
    pub fn is_record_error(&self) -> bool {
        matches!(self, Error::Decode { .. } | Error::Format { .. })
    }
}

/// Result type alias for post-dump
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
