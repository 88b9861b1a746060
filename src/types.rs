//! Common types used throughout post-dump
//!
//! Table identifiers for both ends of the pipeline and the load dispositions
//! understood by every sink.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Table Identifiers
// ============================================================================

/// Location of the wide-column source table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceTable {
    pub project_id: String,
    pub instance_id: String,
    pub table_id: String,
}

impl SourceTable {
    pub fn new(
        project_id: impl Into<String>,
        instance_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            instance_id: instance_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/instances/{}/tables/{}",
            self.project_id, self.instance_id, self.table_id
        )
    }
}

/// Location of the warehouse destination table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationTable {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl DestinationTable {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }
}

/// Rendered as `project:dataset.table`
impl fmt::Display for DestinationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}.{}",
            self.project_id, self.dataset_id, self.table_id
        )
    }
}

// ============================================================================
// Load Dispositions
// ============================================================================

/// What to do when the destination table does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateDisposition {
    /// Create the table from the supplied schema
    #[default]
    CreateIfNeeded,
    /// Fail the load
    CreateNever,
}

/// What to do with rows already in the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Discard prior contents and replace them with this load
    #[default]
    WriteTruncate,
    /// Keep prior contents and add this load
    WriteAppend,
    /// Only write into an empty table
    WriteEmpty,
}

impl fmt::Display for CreateDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateDisposition::CreateIfNeeded => write!(f, "CREATE_IF_NEEDED"),
            CreateDisposition::CreateNever => write!(f, "CREATE_NEVER"),
        }
    }
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteDisposition::WriteTruncate => write!(f, "WRITE_TRUNCATE"),
            WriteDisposition::WriteAppend => write!(f, "WRITE_APPEND"),
            WriteDisposition::WriteEmpty => write!(f, "WRITE_EMPTY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_defaults() {
        assert_eq!(CreateDisposition::default(), CreateDisposition::CreateIfNeeded);
        assert_eq!(WriteDisposition::default(), WriteDisposition::WriteTruncate);
    }

    #[test]
    fn test_disposition_serde() {
        let mode: WriteDisposition = serde_json::from_str("\"write_append\"").unwrap();
        assert_eq!(mode, WriteDisposition::WriteAppend);

        let json = serde_json::to_string(&CreateDisposition::CreateNever).unwrap();
        assert_eq!(json, "\"create_never\"");
    }

    #[test]
    fn test_disposition_display() {
        assert_eq!(WriteDisposition::WriteTruncate.to_string(), "WRITE_TRUNCATE");
        assert_eq!(
            CreateDisposition::CreateIfNeeded.to_string(),
            "CREATE_IF_NEEDED"
        );
    }

    #[test]
    fn test_table_display() {
        let source = SourceTable::new("orbital-heaven-286400", "around-post", "post");
        assert_eq!(
            source.to_string(),
            "projects/orbital-heaven-286400/instances/around-post/tables/post"
        );

        let dest = DestinationTable::new("orbital-heaven-286400", "post_analysis", "daily_dump_1");
        assert_eq!(
            dest.to_string(),
            "orbital-heaven-286400:post_analysis.daily_dump_1"
        );
    }
}
