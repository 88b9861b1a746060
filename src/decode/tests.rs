//! Tests for decode module

use super::*;
use crate::error::{Error, Result};
use crate::source::SourceRow;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn full_row(key: &'static str, lat: &'static str, lon: &'static str) -> SourceRow {
    SourceRow::new(key)
        .with_cell("post", "user", "alice")
        .with_cell("post", "message", "hi")
        .with_cell("location", "lat", lat)
        .with_cell("location", "lon", lon)
}

// ============================================================================
// Field Mapping Tests
// ============================================================================

#[test]
fn test_map_complete_row() {
    let record = PostMapper::new().map(&full_row("p42", "10.0", "-20.0")).unwrap();

    assert_eq!(record, PostRecord::new("p42", "alice", "hi", 10.0, -20.0));
}

#[test]
fn test_post_record_serializes_camel_case() {
    let record = PostRecord::new("p42", "alice", "hi", 10.0, -20.0);
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "postId": "p42",
            "user": "alice",
            "message": "hi",
            "lat": 10.0,
            "lon": -20.0
        })
    );
}

#[test]
fn test_row_key_decoded_lossily() {
    let row = SourceRow::new(vec![b'p', 0xff, b'7'])
        .with_cell("location", "lat", "1")
        .with_cell("location", "lon", "2");

    let record = map_post(&row).unwrap();
    assert_eq!(record.post_id, "p\u{fffd}7");
}

#[test]
fn test_text_columns_decoded_lossily() {
    let row = full_row("p1", "1", "2").with_cell("post", "message", vec![b'h', 0xc3, b'i']);

    let record = map_post(&row).unwrap();
    assert_eq!(record.message, "h\u{fffd}i");
}

#[test]
fn test_unicode_text_preserved() {
    let row = full_row("p1", "1", "2").with_cell("post", "user", "zoë 🌍");
    assert_eq!(map_post(&row).unwrap().user, "zoë 🌍");
}

// ============================================================================
// Absent vs Empty Text Columns
// ============================================================================

#[test]
fn test_absent_user_and_message_default_to_empty() {
    let row = SourceRow::new("p1")
        .with_cell("location", "lat", "1")
        .with_cell("location", "lon", "2");

    let record = map_post(&row).unwrap();
    assert_eq!(record.user, "");
    assert_eq!(record.message, "");
}

#[test]
fn test_present_empty_user_and_message_stay_empty() {
    let row = full_row("p1", "1", "2")
        .with_cell("post", "user", "")
        .with_cell("post", "message", "");

    let record = map_post(&row).unwrap();
    assert_eq!(record.user, "");
    assert_eq!(record.message, "");
}

#[test]
fn test_absent_message_with_present_user() {
    let row = SourceRow::new("p1")
        .with_cell("post", "user", "x")
        .with_cell("location", "lat", "1")
        .with_cell("location", "lon", "2");

    let record = map_post(&row).unwrap();
    assert_eq!(record.user, "x");
    assert_eq!(record.message, "");
}

// ============================================================================
// Coordinate Coercion Tests
// ============================================================================

#[test_case("37.5", 37.5 ; "decimal")]
#[test_case("-122", -122.0 ; "negative integer")]
#[test_case("1e2", 100.0 ; "exponent")]
#[test_case(" 12.25\n", 12.25 ; "surrounding whitespace")]
#[test_case("0", 0.0 ; "explicit zero")]
fn test_lat_parses(text: &'static str, expected: f64) {
    let record = map_post(&full_row("p1", text, "0")).unwrap();
    assert_eq!(record.lat, expected);
}

#[test_case("abc" ; "letters")]
#[test_case("" ; "empty")]
#[test_case("12,5" ; "decimal comma")]
#[test_case("1.0.0" ; "two points")]
fn test_lat_format_error(text: &'static str) {
    let err = map_post(&full_row("p1", text, "0")).unwrap_err();

    match err {
        Error::Format {
            row_key,
            column,
            value,
            ..
        } => {
            assert_eq!(row_key, "p1");
            assert_eq!(column, "location:lat");
            assert_eq!(value, text);
        }
        other => panic!("Expected Format error, got {other:?}"),
    }
}

#[test]
fn test_lon_format_error() {
    let err = map_post(&full_row("p1", "1", "east")).unwrap_err();
    assert!(matches!(err, Error::Format { ref column, .. } if column == "location:lon"));
    assert!(err.is_record_error());
}

// ============================================================================
// Missing Location Tests
// ============================================================================

#[test]
fn test_missing_location_family_fails() {
    let row = SourceRow::new("p1").with_cell("post", "user", "x");

    let err = map_post(&row).unwrap_err();
    match err {
        Error::Decode { row_key, message } => {
            assert_eq!(row_key, "p1");
            assert!(message.contains("location"));
        }
        other => panic!("Expected Decode error, got {other:?}"),
    }
}

#[test]
fn test_missing_lon_qualifier_fails() {
    let row = SourceRow::new("p1")
        .with_cell("post", "user", "x")
        .with_cell("location", "lat", "1.0");

    let err = map_post(&row).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert!(err.to_string().contains("location:lon"));
}

#[test]
fn test_missing_lat_qualifier_fails() {
    let row = SourceRow::new("p1")
        .with_cell("post", "user", "x")
        .with_cell("location", "lon", "-20.0");

    let err = map_post(&row).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert!(err.to_string().contains("location:lat"));
}

#[test]
fn test_missing_location_never_defaults_to_zero() {
    let row = SourceRow::new("p1").with_cell("post", "user", "x");
    assert!(map_post(&row).is_err());
}

// ============================================================================
// Mapper Injection Tests
// ============================================================================

#[test]
fn test_closure_is_a_mapper() {
    let upper = |row: &SourceRow| -> Result<PostRecord> {
        let mut record = map_post(row)?;
        record.user = record.user.to_uppercase();
        Ok(record)
    };

    let record = upper.map(&full_row("p1", "1", "2")).unwrap();
    assert_eq!(record.user, "ALICE");
}

#[test]
fn test_mapper_is_shareable_across_threads() {
    let mapper: std::sync::Arc<dyn RowMapper> = std::sync::Arc::new(PostMapper::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mapper = std::sync::Arc::clone(&mapper);
            std::thread::spawn(move || {
                let row = encode_post(&format!("p{i}"), "u", "m", f64::from(i), 0.0);
                mapper.map(&row).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let record = handle.join().unwrap();
        assert_eq!(record.post_id, format!("p{i}"));
    }
}

// ============================================================================
// Writer Layout Tests
// ============================================================================

#[test]
fn test_encode_post_layout() {
    let row = encode_post("p9", "bob", "yo", 37.5, -122.25);

    assert_eq!(row.key().as_ref(), b"p9");
    assert_eq!(row.value("post", "user").unwrap().as_ref(), b"bob");
    assert_eq!(row.value("location", "lat").unwrap().as_ref(), b"37.5");
    assert_eq!(row.value("location", "lon").unwrap().as_ref(), b"-122.25");
    assert_eq!(
        map_post(&row).unwrap(),
        PostRecord::new("p9", "bob", "yo", 37.5, -122.25)
    );
}
