//! Post row mapper
//!
//! Field rules:
//! - `postId` is the row key, decoded as UTF-8 with replacement characters.
//! - `user` and `message` come from the `post` family. A missing qualifier
//!   yields an empty string.
//! - `lat` and `lon` come from the `location` family and are required. Their
//!   text is parsed as `f64`; anything else fails the row.

use super::types::{
    PostRecord, RowMapper, LAT_QUALIFIER, LOCATION_FAMILY, LON_QUALIFIER, MESSAGE_QUALIFIER,
    POST_FAMILY, USER_QUALIFIER,
};
use crate::error::{Error, Result};
use crate::source::SourceRow;
use bytes::Bytes;

/// Decoder for rows written by the post service
#[derive(Debug, Clone, Copy, Default)]
pub struct PostMapper;

impl PostMapper {
    pub fn new() -> Self {
        Self
    }
}

impl RowMapper for PostMapper {
    fn map(&self, row: &SourceRow) -> Result<PostRecord> {
        map_post(row)
    }
}

/// Decode a post row
pub fn map_post(row: &SourceRow) -> Result<PostRecord> {
    let post_id = row.key_lossy();

    let user = optional_text(row, POST_FAMILY, USER_QUALIFIER);
    let message = optional_text(row, POST_FAMILY, MESSAGE_QUALIFIER);

    // Coordinates are required and never default
    if !row.has_family(LOCATION_FAMILY) {
        return Err(Error::decode(
            post_id,
            format!("missing column family '{LOCATION_FAMILY}'"),
        ));
    }
    let lat = coordinate(row, &post_id, LAT_QUALIFIER)?;
    let lon = coordinate(row, &post_id, LON_QUALIFIER)?;

    Ok(PostRecord {
        post_id,
        user,
        message,
        lat,
        lon,
    })
}

fn lossy(value: &Bytes) -> String {
    String::from_utf8_lossy(value).into_owned()
}

fn optional_text(row: &SourceRow, family: &str, qualifier: &str) -> String {
    row.value(family, qualifier).map(lossy).unwrap_or_default()
}

fn coordinate(row: &SourceRow, post_id: &str, qualifier: &str) -> Result<f64> {
    let column = format!("{LOCATION_FAMILY}:{qualifier}");
    let raw = row
        .value(LOCATION_FAMILY, qualifier)
        .ok_or_else(|| Error::decode(post_id, format!("missing column '{column}'")))?;

    let text = lossy(raw);
    text.trim()
        .parse::<f64>()
        .map_err(|e| Error::format(post_id, column, text.as_str(), e.to_string()))
}

/// Build the row layout the post service writes for one post
///
/// Coordinates are stored as the shortest decimal text that parses back to
/// the same `f64`.
pub fn encode_post(post_id: &str, user: &str, message: &str, lat: f64, lon: f64) -> SourceRow {
    SourceRow::new(post_id.to_owned())
        .with_cell(POST_FAMILY, USER_QUALIFIER, user.to_owned())
        .with_cell(POST_FAMILY, MESSAGE_QUALIFIER, message.to_owned())
        .with_cell(LOCATION_FAMILY, LAT_QUALIFIER, lat.to_string())
        .with_cell(LOCATION_FAMILY, LON_QUALIFIER, lon.to_string())
}
