//! Raw record → `StationReading` normalization.
//!
//! The API has shipped two key casings (legacy EPA `SiteName`/`AQI`/`PM2.5`
//! and MOENV `sitename`/`aqi`/`pm2.5`) and encodes most numbers as strings,
//! with `""` for "no reading". Every field is parsed independently: a bad
//! value becomes `None` or `""`, it never fails the record. Only a record
//! that is not an object, or that has no site id, is dropped.

use serde_json::Value;

use crate::error::RecordError;
use crate::logging;
use crate::model::{RawRecord, StationReading};

// ---------------------------------------------------------------------------
// Accepted keys, first match wins
// ---------------------------------------------------------------------------

const SITE_ID: &[&str] = &["SiteId", "siteid", "site_id"];
const SITE_NAME: &[&str] = &["SiteName", "sitename", "site_name"];
const COUNTY: &[&str] = &["County", "county"];
const LATITUDE: &[&str] = &["Latitude", "latitude"];
const LONGITUDE: &[&str] = &["Longitude", "longitude"];
const AQI: &[&str] = &["AQI", "aqi"];
const PM25: &[&str] = &["PM2.5", "pm2.5", "pm25"];
const STATUS: &[&str] = &["Status", "status"];
const POLLUTANT: &[&str] = &["Pollutant", "pollutant"];
const PUBLISH_TIME: &[&str] = &["PublishTime", "publishtime", "publish_time"];
const WIND_SPEED: &[&str] = &["WindSpeed", "wind_speed"];
const WIND_DIRECTION: &[&str] = &["WindDirec", "wind_direc", "wind_direction"];

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

/// String form of a scalar field; `""` when absent or not a scalar.
fn text(raw: &RawRecord, keys: &[&str]) -> String {
    match raw.field(keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn optional_text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    Some(text(raw, keys)).filter(|s| !s.is_empty())
}

/// A finite float from a JSON number or numeric string.
fn float(raw: &RawRecord, keys: &[&str]) -> Option<f64> {
    let value = match raw.field(keys)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// An integer AQI. Fractional values (`"75.0"`, `75.6`) are truncated;
/// negative fractions round down so they stay negative.
fn integer(raw: &RawRecord, keys: &[&str]) -> Option<i64> {
    match raw.field(keys)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

fn truncate(value: f64) -> Option<i64> {
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        let whole = if value < 0.0 { value.floor() } else { value.trunc() };
        Some(whole as i64)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalizes one record.
///
/// `status` carries whatever the API reported; `color` is left empty.
/// Both are set by `classify::annotate`.
pub fn normalize(raw: &RawRecord) -> Result<StationReading, RecordError> {
    if !raw.0.is_object() {
        return Err(RecordError::NotAnObject);
    }

    let site_id = text(raw, SITE_ID);
    if site_id.is_empty() {
        return Err(RecordError::MissingSiteId {
            site_name: raw.display_name(),
        });
    }

    Ok(StationReading {
        site_id,
        site_name: text(raw, SITE_NAME),
        county: text(raw, COUNTY),
        latitude: float(raw, LATITUDE),
        longitude: float(raw, LONGITUDE),
        aqi: integer(raw, AQI),
        pm25: float(raw, PM25),
        status: text(raw, STATUS),
        color: String::new(),
        pollutant: text(raw, POLLUTANT),
        publish_time: text(raw, PUBLISH_TIME),
        wind_speed: float(raw, WIND_SPEED),
        wind_direction: optional_text(raw, WIND_DIRECTION),
    })
}

/// A record dropped during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Position in the API response.
    pub index: usize,
    pub error: RecordError,
}

/// Outcome of normalizing a whole response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub readings: Vec<StationReading>,
    pub skipped: Vec<SkippedRecord>,
}

/// Normalizes every record, logging and counting the ones that are dropped.
pub fn normalize_all(records: &[RawRecord]) -> Normalized {
    let mut out = Normalized::default();

    for (index, raw) in records.iter().enumerate() {
        match normalize(raw) {
            Ok(reading) => out.readings.push(reading),
            Err(error) => {
                logging::log_record_skip(index, &error);
                out.skipped.push(SkippedRecord { index, error });
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord(value)
    }

    #[test]
    fn test_string_encoded_numbers() {
        let reading = normalize(&raw(json!({
            "aqi": "75",
            "pm25": "12.3",
            "latitude": "25.03",
            "longitude": "121.56",
            "site_id": "001"
        })))
        .unwrap();

        assert_eq!(reading.site_id, "001");
        assert_eq!(reading.aqi, Some(75));
        assert_eq!(reading.pm25, Some(12.3));
        assert_eq!(reading.latitude, Some(25.03));
        assert_eq!(reading.longitude, Some(121.56));
        assert_eq!(reading.site_name, "");
        assert_eq!(reading.wind_direction, None);
    }

    #[test]
    fn test_legacy_epa_casing() {
        let reading = normalize(&raw(json!({
            "SiteId": "12",
            "SiteName": "中山",
            "County": "臺北市",
            "AQI": "38",
            "PM2.5": "8",
            "Status": "良好",
            "Pollutant": "",
            "PublishTime": "2024/05/01 13:00:00",
            "WindSpeed": "1.9",
            "WindDirec": "62",
            "Latitude": "25.062361",
            "Longitude": "121.526528"
        })))
        .unwrap();

        assert_eq!(reading.site_id, "12");
        assert_eq!(reading.site_name, "中山");
        assert_eq!(reading.county, "臺北市");
        assert_eq!(reading.aqi, Some(38));
        assert_eq!(reading.pm25, Some(8.0));
        assert_eq!(reading.status, "良好");
        assert_eq!(reading.publish_time, "2024/05/01 13:00:00");
        assert_eq!(reading.wind_speed, Some(1.9));
        assert_eq!(reading.wind_direction.as_deref(), Some("62"));
    }

    #[test]
    fn test_moenv_casing_with_json_numbers() {
        let reading = normalize(&raw(json!({
            "siteid": 12,
            "sitename": "中山",
            "aqi": 38.0,
            "pm2.5": 8.5,
            "publishtime": "2024-05-01 13:00",
            "wind_speed": 1.2,
            "wind_direc": 270
        })))
        .unwrap();

        assert_eq!(reading.site_id, "12");
        assert_eq!(reading.aqi, Some(38));
        assert_eq!(reading.pm25, Some(8.5));
        assert_eq!(reading.wind_speed, Some(1.2));
        assert_eq!(reading.wind_direction.as_deref(), Some("270"));
    }

    #[test]
    fn test_blank_and_garbage_values_become_none() {
        let reading = normalize(&raw(json!({
            "siteid": "7",
            "aqi": "",
            "pm2.5": "ND",
            "latitude": "north",
            "wind_speed": "NaN",
            "wind_direc": "  "
        })))
        .unwrap();

        assert_eq!(reading.aqi, None);
        assert_eq!(reading.pm25, None);
        assert_eq!(reading.latitude, None);
        assert_eq!(reading.wind_speed, None);
        assert_eq!(reading.wind_direction, None);
    }

    #[test]
    fn test_fractional_aqi_is_truncated() {
        let reading = normalize(&raw(json!({ "siteid": "7", "aqi": "75.9" }))).unwrap();
        assert_eq!(reading.aqi, Some(75));
    }

    #[test]
    fn test_negative_aqi_is_kept_as_reported() {
        let reading = normalize(&raw(json!({ "siteid": "7", "aqi": "-1" }))).unwrap();
        assert_eq!(reading.aqi, Some(-1));
    }

    #[test]
    fn test_negative_fractional_aqi_stays_negative() {
        for value in [json!("-0.5"), json!(-0.5), json!("-1.9")] {
            let reading = normalize(&raw(json!({ "siteid": "7", "aqi": value }))).unwrap();
            assert!(reading.aqi.is_some_and(|aqi| aqi < 0), "{:?}", reading.aqi);
            assert_eq!(crate::classify::classify(reading.aqi), crate::classify::AqiCategory::Unknown);
        }
    }

    #[test]
    fn test_missing_latitude_keeps_record_but_not_coordinates() {
        let reading = normalize(&raw(json!({
            "siteid": "7",
            "longitude": "121.5"
        })))
        .unwrap();
        assert!(reading.coordinates().is_none());
    }

    #[test]
    fn test_missing_or_blank_site_id_is_dropped() {
        let err = normalize(&raw(json!({ "sitename": "板橋", "aqi": "40" }))).unwrap_err();
        assert_eq!(
            err,
            RecordError::MissingSiteId {
                site_name: "板橋".to_string()
            }
        );

        let err = normalize(&raw(json!({ "siteid": " ", "aqi": "40" }))).unwrap_err();
        assert!(matches!(err, RecordError::MissingSiteId { .. }));
    }

    #[test]
    fn test_non_object_is_dropped() {
        assert_eq!(normalize(&raw(json!(42))), Err(RecordError::NotAnObject));
        assert_eq!(normalize(&raw(json!(["a"]))), Err(RecordError::NotAnObject));
    }

    #[test]
    fn test_normalize_all_counts_skips() {
        let records = vec![
            raw(json!({ "siteid": "1", "aqi": "10" })),
            raw(json!("garbage")),
            raw(json!({ "siteid": "2", "aqi": "20" })),
            raw(json!({ "aqi": "30" })),
        ];

        let out = normalize_all(&records);
        assert_eq!(out.readings.len(), 2);
        assert_eq!(out.skipped.len(), 2);
        assert_eq!(out.skipped[0].index, 1);
        assert_eq!(out.skipped[1].index, 3);
    }
}
