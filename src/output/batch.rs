//! Post records to Arrow conversion
//!
//! Columns are built by schema field name, so the batch always follows the
//! schema's column order.

use crate::decode::PostRecord;
use crate::error::{Error, Result};
use crate::schema::{FieldSchema, FieldType, TableSchema};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Convert post records to a RecordBatch shaped by `schema`
pub fn records_to_batch(records: &[PostRecord], schema: &TableSchema) -> Result<RecordBatch> {
    let arrow_schema = Arc::new(schema.to_arrow());

    if records.is_empty() {
        return Ok(RecordBatch::new_empty(arrow_schema));
    }

    let columns = schema
        .fields()
        .iter()
        .map(|field| build_column(field, records))
        .collect::<Result<Vec<_>>>()?;

    let batch = RecordBatch::try_new(arrow_schema, columns)?;
    schema.validate_batch(&batch)?;
    Ok(batch)
}

fn build_column(field: &FieldSchema, records: &[PostRecord]) -> Result<ArrayRef> {
    let array: ArrayRef = match (field.name.as_str(), field.field_type) {
        ("postId", FieldType::String) => Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.post_id.as_str()),
        )),
        ("user", FieldType::String) => Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.user.as_str()),
        )),
        ("message", FieldType::String) => Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.message.as_str()),
        )),
        ("lat", FieldType::Float) => {
            Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.lat)))
        }
        ("lon", FieldType::Float) => {
            Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.lon)))
        }
        (name, field_type) => {
            return Err(Error::schema_mismatch(
                "records",
                format!("no post field maps to column '{name}' ({field_type})"),
            ))
        }
    };
    Ok(array)
}

/// Convert a RecordBatch with post columns back into records
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<PostRecord>> {
    let post_ids = string_column(batch, "postId")?;
    let users = string_column(batch, "user")?;
    let messages = string_column(batch, "message")?;
    let lats = float_column(batch, "lat")?;
    let lons = float_column(batch, "lon")?;

    let records = (0..batch.num_rows())
        .map(|i| PostRecord {
            post_id: text_at(post_ids, i),
            user: text_at(users, i),
            message: text_at(messages, i),
            lat: lats.value(i),
            lon: lons.value(i),
        })
        .collect();
    Ok(records)
}

fn text_at(array: &StringArray, row: usize) -> String {
    if array.is_null(row) {
        String::new()
    } else {
        array.value(row).to_string()
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::schema_mismatch("batch", format!("missing STRING column '{name}'")))
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| Error::schema_mismatch("batch", format!("missing FLOAT column '{name}'")))
}
