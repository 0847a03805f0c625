//! Run statistics over classified readings.
//!
//! Used for the end-of-run console report and the statistics box on the map.

use std::collections::BTreeMap;

use haversine::{Location as HaversineLocation, Units, distance};

use crate::classify::{AqiCategory, classify};
use crate::model::{GeoPoint, StationReading};

/// Aggregate figures for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiSummary {
    pub total_stations: usize,
    /// Stations whose AQI falls into one of the six valid bands.
    pub valid_aqi: usize,
    pub min_aqi: Option<i64>,
    pub max_aqi: Option<i64>,
    pub mean_aqi: Option<f64>,
    pub per_category: BTreeMap<AqiCategory, usize>,
    pub mapped: usize,
    pub unmapped: usize,
}

impl AqiSummary {
    pub fn from_readings(readings: &[StationReading]) -> Self {
        let valid: Vec<i64> = readings
            .iter()
            .filter_map(|r| r.aqi.filter(|_| classify(r.aqi) != AqiCategory::Unknown))
            .collect();

        let mut per_category = BTreeMap::new();
        for reading in readings {
            *per_category.entry(classify(reading.aqi)).or_insert(0) += 1;
        }

        let mapped = readings.iter().filter(|r| r.coordinates().is_some()).count();

        let mean_aqi = if valid.is_empty() {
            None
        } else {
            Some(valid.iter().map(|&v| v as f64).sum::<f64>() / valid.len() as f64)
        };

        AqiSummary {
            total_stations: readings.len(),
            valid_aqi: valid.len(),
            min_aqi: valid.iter().copied().min(),
            max_aqi: valid.iter().copied().max(),
            mean_aqi,
            per_category,
            mapped,
            unmapped: readings.len() - mapped,
        }
    }

    pub fn count(&self, category: AqiCategory) -> usize {
        self.per_category.get(&category).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Great-circle distance between two points, in kilometres.
pub fn distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        HaversineLocation {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        Units::Kilometers,
    )
}

/// The mapped station closest to `reference`, with its distance in km.
pub fn nearest_to(reference: GeoPoint, readings: &[StationReading]) -> Option<(&StationReading, f64)> {
    readings
        .iter()
        .filter_map(|r| r.coordinates().map(|p| (r, distance_km(reference, p))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

// ---------------------------------------------------------------------------
// Console preview
// ---------------------------------------------------------------------------

/// One line per station for the first `n` readings.
pub fn preview(readings: &[StationReading], n: usize) -> Vec<String> {
    readings
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, r)| {
            let aqi = r.aqi.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string());
            format!("{}. {} ({}) - AQI: {}", i + 1, r.site_name, r.county, aqi)
        })
        .collect()
}
