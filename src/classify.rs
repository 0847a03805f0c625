//! AQI category classification.
//!
//! Maps an AQI value onto the six health-risk bands used by the Taiwan
//! and US AQI scales, plus `Unknown` for missing or invalid values. The
//! band decides both the status label and the marker color on the map.

use std::fmt;

use crate::model::StationReading;

/// AQI health-risk bands, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl AqiCategory {
    /// Every band in display order, `Unknown` last.
    pub const ALL: [AqiCategory; 7] = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthySensitive,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
        AqiCategory::Hazardous,
        AqiCategory::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
            AqiCategory::Unknown => "Unknown",
        }
    }

    /// Symbolic color name, usable directly as a CSS color.
    pub fn color(self) -> &'static str {
        match self {
            AqiCategory::Good => "green",
            AqiCategory::Moderate => "yellow",
            AqiCategory::UnhealthySensitive => "orange",
            AqiCategory::Unhealthy => "red",
            AqiCategory::VeryUnhealthy => "purple",
            AqiCategory::Hazardous => "brown",
            AqiCategory::Unknown => "gray",
        }
    }

    /// Inclusive AQI range covered by the band, for legends.
    /// `None` upper bound means open-ended.
    pub fn range(self) -> Option<(i64, Option<i64>)> {
        match self {
            AqiCategory::Good => Some((0, Some(50))),
            AqiCategory::Moderate => Some((51, Some(100))),
            AqiCategory::UnhealthySensitive => Some((101, Some(150))),
            AqiCategory::Unhealthy => Some((151, Some(200))),
            AqiCategory::VeryUnhealthy => Some((201, Some(300))),
            AqiCategory::Hazardous => Some((301, None)),
            AqiCategory::Unknown => None,
        }
    }

    /// Legend text for the band, e.g. `"51-100"` or `"301+"`.
    pub fn range_label(self) -> String {
        match self.range() {
            Some((low, Some(high))) => format!("{}-{}", low, high),
            Some((low, None)) => format!("{}+", low),
            None => "N/A".to_string(),
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies an AQI value.
///
/// Negative values are not valid AQI readings and classify as `Unknown`
/// rather than being clamped to zero.
pub fn classify(aqi: Option<i64>) -> AqiCategory {
    match aqi {
        Some(v) if v < 0 => AqiCategory::Unknown,
        Some(0..=50) => AqiCategory::Good,
        Some(51..=100) => AqiCategory::Moderate,
        Some(101..=150) => AqiCategory::UnhealthySensitive,
        Some(151..=200) => AqiCategory::Unhealthy,
        Some(201..=300) => AqiCategory::VeryUnhealthy,
        Some(_) => AqiCategory::Hazardous,
        None => AqiCategory::Unknown,
    }
}

/// Sets `status` and `color` on a reading from its `aqi`.
///
/// Whatever status the API reported is replaced, so the pair is always
/// derived from the AQI value alone.
pub fn annotate(reading: &mut StationReading) -> AqiCategory {
    let category = classify(reading.aqi);
    reading.status = category.label().to_string();
    reading.color = category.color().to_string();
    category
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
