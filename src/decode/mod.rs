//! Row decoder module
//!
//! Turns wide-column post rows into flat, typed `PostRecord`s.
//!
//! # Overview
//!
//! Mapping is a pure function of one row. `RowMapper` is the injection point;
//! `PostMapper` is the production mapper and plain closures work too.

mod mapper;
mod types;

pub use mapper::{encode_post, map_post, PostMapper};
pub use types::{
    PostRecord, RowMapper, LAT_QUALIFIER, LOCATION_FAMILY, LON_QUALIFIER, MESSAGE_QUALIFIER,
    POST_FAMILY, USER_QUALIFIER,
};

#[cfg(test)]
mod tests;
