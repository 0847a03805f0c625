//! Interactive station map as a single self-contained Leaflet HTML page.
//!
//! One circle marker per station with usable coordinates, filled with the
//! classifier color. Stations without coordinates are left off the map and
//! only show up in the statistics box count.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::analysis::summary::{AqiSummary, distance_km};
use crate::classify::AqiCategory;
use crate::error::OutputError;
use crate::model::{GeoPoint, StationReading, TAIPEI_MAIN_STATION, TAIWAN_CENTER};
use crate::output::{OutputKind, write_atomically};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const ZOOM_START: u8 = 8;

/// Marker data handed to the page script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub site_id: String,
    pub lat: f64,
    pub lon: f64,
    pub color: String,
    pub tooltip: String,
    pub popup: String,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn text_or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

pub fn tooltip(reading: &StationReading) -> String {
    format!("{}: AQI {}", reading.site_name, or_na(reading.aqi))
}

/// Popup body. Every value is escaped; the API is not trusted to send HTML-safe text.
pub fn popup_html(reading: &StationReading, distance_km: Option<f64>) -> String {
    let rows = [
        ("Station", escape_html(&reading.site_name)),
        ("County", escape_html(&reading.county)),
        ("AQI", or_na(reading.aqi)),
        ("Status", escape_html(&reading.status)),
        ("Pollutant", escape_html(text_or_na(&reading.pollutant))),
        ("PM2.5", or_na(reading.pm25)),
        ("Wind speed", or_na(reading.wind_speed)),
        (
            "Wind direction",
            escape_html(reading.wind_direction.as_deref().unwrap_or("N/A")),
        ),
        ("Published", escape_html(text_or_na(&reading.publish_time))),
        ("To Taipei Main Station", or_na(distance_km.map(|d| format!("{:.1} km", d)))),
    ];

    let mut html = String::from("<div style=\"width: 220px;\">");
    for (label, value) in rows {
        let _ = write!(html, "<b>{}:</b> {}<br>", label, value);
    }
    html.push_str("</div>");
    html
}

/// Markers for every reading with usable coordinates, in input order.
pub fn markers(readings: &[StationReading]) -> Vec<MapMarker> {
    readings
        .iter()
        .filter_map(|r| {
            let point = r.coordinates()?;
            let km = distance_km(TAIPEI_MAIN_STATION, point);
            Some(MapMarker {
                site_id: r.site_id.clone(),
                lat: point.latitude,
                lon: point.longitude,
                color: r.color.clone(),
                tooltip: escape_html(&tooltip(r)),
                popup: popup_html(r, Some(km)),
            })
        })
        .collect()
}

/// Mean position of the mapped stations, or the middle of Taiwan.
pub fn center(markers: &[MapMarker]) -> GeoPoint {
    if markers.is_empty() {
        return TAIWAN_CENTER;
    }
    let n = markers.len() as f64;
    GeoPoint {
        latitude: markers.iter().map(|m| m.lat).sum::<f64>() / n,
        longitude: markers.iter().map(|m| m.lon).sum::<f64>() / n,
    }
}

pub fn legend_html() -> String {
    let mut html = String::from(
        "<div class=\"aqmon-box\" style=\"bottom: 30px; left: 30px;\"><h4>AQI Legend</h4>",
    );
    for category in AqiCategory::ALL {
        let _ = write!(
            html,
            "<p><span class=\"swatch\" style=\"background:{}\"></span> {} ({})</p>",
            category.color(),
            category.range_label(),
            escape_html(category.label())
        );
    }
    html.push_str("</div>");
    html
}

pub fn stats_html(summary: &AqiSummary) -> String {
    let mean = summary
        .mean_aqi
        .map(|m| format!("{:.1}", m))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "<div class=\"aqmon-box\" style=\"bottom: 30px; right: 30px;\"><h4>Air Quality Summary</h4>\
         <p><b>Stations:</b> {}</p>\
         <p><b>Valid AQI:</b> {}</p>\
         <p><b>Mean AQI:</b> {}</p>\
         <p><b>Max AQI:</b> {}</p>\
         <p><b>Not mapped:</b> {}</p></div>",
        summary.total_stations,
        summary.valid_aqi,
        mean,
        or_na(summary.max_aqi),
        summary.unmapped
    )
}

/// Marker JSON that is safe to inline in a `<script>` element.
fn script_json(markers: &[MapMarker]) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(markers)?.replace("</", "<\\/"))
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub fn render_map(
    readings: &[StationReading],
    summary: &AqiSummary,
    generated_at: &DateTime<Local>,
) -> Result<String, serde_json::Error> {
    let markers = markers(readings);
    let center = center(&markers);
    let data = script_json(&markers)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>AQI map {generated}</title>
<link rel="stylesheet" href="{css}">
<script src="{js}"></script>
<style>
html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
.aqmon-box {{ position: fixed; z-index: 9999; background: white; border: 2px solid grey;
  font-size: 14px; padding: 10px; font-family: sans-serif; }}
.aqmon-box h4 {{ margin: 0 0 6px 0; }}
.aqmon-box p {{ margin: 2px 0; }}
.swatch {{ display: inline-block; width: 12px; height: 12px; border-radius: 6px; }}
</style>
</head>
<body>
<div id="map"></div>
{legend}
{stats}
<script>
var map = L.map("map").setView([{lat}, {lon}], {zoom});
L.tileLayer("{tiles}", {{
  maxZoom: 18,
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
var stations = {data};
stations.forEach(function (s) {{
  L.circleMarker([s.lat, s.lon], {{
    radius: 10,
    color: s.color,
    weight: 2,
    fill: true,
    fillColor: s.color,
    fillOpacity: 0.7
  }}).bindPopup(s.popup, {{ maxWidth: 300 }})
    .bindTooltip(s.tooltip)
    .addTo(map);
}});
</script>
</body>
</html>
"#,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
        css = LEAFLET_CSS,
        js = LEAFLET_JS,
        legend = legend_html(),
        stats = stats_html(summary),
        lat = center.latitude,
        lon = center.longitude,
        zoom = ZOOM_START,
        tiles = TILE_URL,
        data = data,
    ))
}

pub fn save(
    path: &Path,
    readings: &[StationReading],
    summary: &AqiSummary,
    generated_at: &DateTime<Local>,
) -> Result<(), OutputError> {
    let html = render_map(readings, summary, generated_at).map_err(|e| OutputError::Encode {
        kind: OutputKind::Map,
        message: e.to_string(),
    })?;

    write_atomically(OutputKind::Map, path, |w| {
        w.write_all(html.as_bytes()).map_err(|source| OutputError::Io {
            kind: OutputKind::Map,
            path: path.to_path_buf(),
            source,
        })
    })
}
