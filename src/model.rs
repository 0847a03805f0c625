/// Core data types for the air-quality mapping tool.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O: the loosely-typed record as it arrives from the API,
/// and the strict reading the rest of the pipeline works with.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reference point
// ---------------------------------------------------------------------------

/// Taipei Main Station, used as the reference point for station distances.
pub const TAIPEI_MAIN_STATION: GeoPoint = GeoPoint {
    latitude: 25.0478,
    longitude: 121.5170,
};

/// Geographic centre of Taiwan, used to center an empty map.
pub const TAIWAN_CENTER: GeoPoint = GeoPoint {
    latitude: 23.6978,
    longitude: 120.9605,
};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Raw record
// ---------------------------------------------------------------------------

/// One station record exactly as decoded from the API response.
///
/// The upstream service has changed field casing and value types over time
/// (numbers arrive as strings, blanks stand in for missing values), so the
/// record is kept as an untyped JSON value until `analysis::normalize`
/// turns it into a `StationReading`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord(pub serde_json::Value);

impl RawRecord {
    /// Looks up the first of `keys` holding a non-null value.
    pub fn field(&self, keys: &[&str]) -> Option<&serde_json::Value> {
        let object = self.0.as_object()?;
        keys.iter()
            .filter_map(|key| object.get(*key))
            .find(|value| !value.is_null())
    }

    /// Site name for log lines, before the record has been normalized.
    pub fn display_name(&self) -> String {
        self.field(&["SiteName", "sitename", "site_name"])
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()
    }
}

impl From<serde_json::Value> for RawRecord {
    fn from(value: serde_json::Value) -> Self {
        RawRecord(value)
    }
}

// ---------------------------------------------------------------------------
// Station reading
// ---------------------------------------------------------------------------

/// The latest reading for one monitoring station.
///
/// Field order is the column order of the CSV output and the key order of the
/// JSON output. `status` and `color` are filled in by `classify::annotate`
/// and are a pure function of `aqi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReading {
    pub site_id: String,
    pub site_name: String,
    pub county: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub aqi: Option<i64>,
    pub pm25: Option<f64>,
    pub status: String,
    pub color: String,
    pub pollutant: String,
    pub publish_time: String, // as published, e.g. "2024/05/01 13:00:00"
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<String>,
}

impl StationReading {
    /// Returns the station position if it can be placed on a map.
    ///
    /// Upstream uses `0` as a placeholder for unknown coordinates, so a zero
    /// in either component counts as missing, as does anything out of range.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        let latitude = self.latitude?;
        let longitude = self.longitude?;

        let in_range = latitude.abs() <= 90.0 && longitude.abs() <= 180.0;
        if !in_range || latitude == 0.0 || longitude == 0.0 {
            return None;
        }

        Some(GeoPoint { latitude, longitude })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
