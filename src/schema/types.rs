//! Schema types

use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Warehouse column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Float,
}

impl FieldType {
    /// Arrow type used for in-memory batches
    pub fn arrow_type(self) -> DataType {
        match self {
            FieldType::String => DataType::Utf8,
            FieldType::Float => DataType::Float64,
        }
    }

    /// Column type used in warehouse DDL
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::String => "VARCHAR",
            FieldType::Float => "DOUBLE",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "STRING"),
            FieldType::Float => write!(f, "FLOAT"),
        }
    }
}

/// Column nullability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
}

/// One column of a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
}

impl FieldSchema {
    /// Create a nullable field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode: FieldMode::Nullable,
        }
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.mode = FieldMode::Required;
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.mode == FieldMode::Nullable
    }

    pub fn to_arrow(&self) -> Field {
        Field::new(&self.name, self.field_type.arrow_type(), self.is_nullable())
    }
}

/// Ordered column list of a destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<FieldSchema>,
}

impl TableSchema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in order
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Arrow schema with the same columns
    pub fn to_arrow(&self) -> Schema {
        Schema::new(
            self.fields
                .iter()
                .map(FieldSchema::to_arrow)
                .collect::<Vec<_>>(),
        )
    }

    /// Column list for `CREATE TABLE`, e.g. `"postId" VARCHAR, "lat" DOUBLE`
    pub fn to_ddl_columns(&self) -> String {
        self.fields
            .iter()
            .map(|f| {
                let not_null = if f.is_nullable() { "" } else { " NOT NULL" };
                format!(
                    "{} {}{not_null}",
                    quote_ident(&f.name),
                    f.field_type.sql_type()
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check that a batch carries exactly these columns, in order, with matching types
    pub fn validate_batch(&self, batch: &RecordBatch) -> Result<()> {
        let batch_schema = batch.schema();
        let batch_fields = batch_schema.fields();

        if batch_fields.len() != self.fields.len() {
            return Err(Error::schema_mismatch(
                "batch",
                format!(
                    "expected {} columns, found {}",
                    self.fields.len(),
                    batch_fields.len()
                ),
            ));
        }

        for (expected, actual) in self.fields.iter().zip(batch_fields.iter()) {
            if expected.name != *actual.name() {
                return Err(Error::schema_mismatch(
                    "batch",
                    format!("expected column '{}', found '{}'", expected.name, actual.name()),
                ));
            }
            if expected.field_type.arrow_type() != *actual.data_type() {
                return Err(Error::schema_mismatch(
                    "batch",
                    format!(
                        "column '{}' should be {}, found {}",
                        expected.name,
                        expected.field_type,
                        actual.data_type()
                    ),
                ));
            }
            if !expected.is_nullable() {
                let column = batch.column_by_name(&expected.name);
                if column.is_some_and(|c| c.null_count() > 0) {
                    return Err(Error::schema_mismatch(
                        "batch",
                        format!("required column '{}' contains nulls", expected.name),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Quote an identifier for warehouse SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
