// Coordinate extraction — raw photo record to map point.
//
// Plenty of photos have no usable location even with `has_geo=1`. Those are
// a normal outcome, not an error: they count as processed but never reach
// the map. Out-of-range coordinates are treated the same way so bad
// upstream data can't put a marker somewhere impossible.

use chrono::{DateTime, Utc};

use crate::flickr::photos::{value_as_f64, value_as_i64, RawPhoto};
use crate::models::GeoPoint;

/// Outcome of extracting a location from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Point(GeoPoint),
    NoLocation,
}

/// Extract a `GeoPoint` from a record, or `NoLocation`.
pub fn extract(record: &RawPhoto) -> Extracted {
    if record.id.is_empty() {
        return Extracted::NoLocation;
    }

    let lat = record.latitude.as_ref().and_then(value_as_f64);
    let lon = record.longitude.as_ref().and_then(value_as_f64);
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return Extracted::NoLocation;
    };

    if !valid_coordinates(lat, lon) {
        return Extracted::NoLocation;
    }

    Extracted::Point(GeoPoint {
        id: record.id.clone(),
        lat,
        lon,
        timestamp: record.dateupload.as_ref().and_then(upload_time),
        title: record.title.clone(),
    })
}

/// Finite, in range, and not Flickr's (0, 0) "no geotag" placeholder.
fn valid_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
        && !(lat == 0.0 && lon == 0.0)
}

fn upload_time(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    value_as_i64(value).and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_numeric_coordinates() {
        let mut record = RawPhoto::new("42", &["nice"], 43.7, 7.26);
        record.dateupload = Some(json!("1700000000"));

        match extract(&record) {
            Extracted::Point(p) => {
                assert_eq!(p.id, "42");
                assert_eq!(p.lat, 43.7);
                assert_eq!(p.lon, 7.26);
                assert_eq!(p.timestamp.unwrap().timestamp(), 1_700_000_000);
                assert_eq!(p.title, "photo 42");
            }
            Extracted::NoLocation => panic!("expected a point"),
        }
    }

    #[test]
    fn test_extract_string_coordinates() {
        let mut record = RawPhoto::new("7", &[], 0.0, 0.0);
        record.latitude = Some(json!("-33.86"));
        record.longitude = Some(json!("151.2"));
        assert!(matches!(extract(&record), Extracted::Point(_)));
    }

    #[test]
    fn test_missing_coordinates_is_no_location() {
        let mut record = RawPhoto::new("1", &[], 1.0, 1.0);
        record.latitude = None;
        assert_eq!(extract(&record), Extracted::NoLocation);
    }

    #[test]
    fn test_zero_zero_is_no_location() {
        let mut record = RawPhoto::new("1", &[], 0.0, 0.0);
        record.latitude = Some(json!("0"));
        record.longitude = Some(json!(0));
        assert_eq!(extract(&record), Extracted::NoLocation);
    }

    #[test]
    fn test_out_of_range_is_no_location() {
        assert_eq!(
            extract(&RawPhoto::new("1", &[], 91.0, 10.0)),
            Extracted::NoLocation
        );
        assert_eq!(
            extract(&RawPhoto::new("1", &[], 10.0, -180.5)),
            Extracted::NoLocation
        );
    }

    #[test]
    fn test_boundary_values_are_valid() {
        assert!(matches!(
            extract(&RawPhoto::new("1", &[], 90.0, -180.0)),
            Extracted::Point(_)
        ));
    }

    #[test]
    fn test_garbage_coordinates_is_no_location() {
        let mut record = RawPhoto::new("1", &[], 1.0, 1.0);
        record.longitude = Some(json!("east-ish"));
        assert_eq!(extract(&record), Extracted::NoLocation);
    }

    #[test]
    fn test_empty_id_is_no_location() {
        assert_eq!(
            extract(&RawPhoto::new("", &[], 10.0, 10.0)),
            Extracted::NoLocation
        );
    }

    #[test]
    fn test_bad_timestamp_keeps_point() {
        let mut record = RawPhoto::new("1", &[], 10.0, 10.0);
        record.dateupload = Some(json!("yesterday"));
        match extract(&record) {
            Extracted::Point(p) => assert!(p.timestamp.is_none()),
            Extracted::NoLocation => panic!("expected a point"),
        }
    }
}
