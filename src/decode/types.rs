//! Decoder types and traits
//!
//! Defines the flat output record and the row mapping abstraction.

use crate::error::Result;
use crate::source::SourceRow;
use serde::{Deserialize, Serialize};

/// Column family holding post content
pub const POST_FAMILY: &str = "post";
/// Column family holding coordinates
pub const LOCATION_FAMILY: &str = "location";

pub const USER_QUALIFIER: &str = "user";
pub const MESSAGE_QUALIFIER: &str = "message";
pub const LAT_QUALIFIER: &str = "lat";
pub const LON_QUALIFIER: &str = "lon";

/// One post, flattened for the warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub post_id: String,
    pub user: String,
    pub message: String,
    pub lat: f64,
    pub lon: f64,
}

impl PostRecord {
    pub fn new(
        post_id: impl Into<String>,
        user: impl Into<String>,
        message: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            user: user.into(),
            message: message.into(),
            lat,
            lon,
        }
    }
}

/// Maps one source row to one output record
///
/// Implementations must be pure: no shared mutable state, so the engine can
/// call them on many rows at once.
pub trait RowMapper: Send + Sync {
    fn map(&self, row: &SourceRow) -> Result<PostRecord>;
}

impl<F> RowMapper for F
where
    F: Fn(&SourceRow) -> Result<PostRecord> + Send + Sync,
{
    fn map(&self, row: &SourceRow) -> Result<PostRecord> {
        self(row)
    }
}
