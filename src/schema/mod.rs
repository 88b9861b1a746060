//! Destination schema module
//!
//! The output table shape is a static value. There is no inference: changing
//! the mapped fields means updating `POST_SCHEMA` and the post mapper together.

mod types;

pub use types::{quote_ident, FieldMode, FieldSchema, FieldType, TableSchema};

use once_cell::sync::Lazy;

/// Schema of the post snapshot table
pub static POST_SCHEMA: Lazy<TableSchema> = Lazy::new(|| {
    TableSchema::new(vec![
        FieldSchema::new("postId", FieldType::String),
        FieldSchema::new("user", FieldType::String),
        FieldSchema::new("message", FieldType::String),
        FieldSchema::new("lat", FieldType::Float),
        FieldSchema::new("lon", FieldType::Float),
    ])
});

/// The post snapshot schema
pub fn post_schema() -> TableSchema {
    POST_SCHEMA.clone()
}
