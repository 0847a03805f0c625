//! One run of the tool: fetch → normalize → classify → summarize → write.
//!
//! `run` performs the single API call; `process` is everything after it and
//! needs no network, which is how the integration tests drive it.

use chrono::{DateTime, Local};

use crate::analysis::normalize::{self, SkippedRecord};
use crate::analysis::summary::{self, AqiSummary};
use crate::classify;
use crate::config::AppConfig;
use crate::error::{AqmonError, Result};
use crate::ingest::moenv;
use crate::logging::{self, Stage};
use crate::model::{RawRecord, StationReading, TAIPEI_MAIN_STATION};
use crate::output::{self, OutputReport};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Records in the API response.
    pub fetched: usize,
    pub readings: Vec<StationReading>,
    pub skipped: Vec<SkippedRecord>,
    pub summary: AqiSummary,
    pub outputs: OutputReport,
}

impl RunReport {
    /// Turns per-writer failures into a run-level error once all writers have run.
    pub fn into_result(self) -> Result<RunReport> {
        let failed = self.outputs.failures().len();
        if failed > 0 {
            return Err(AqmonError::Output { failed });
        }
        Ok(self)
    }
}

/// Fetches the current readings and processes them.
///
/// Network and API failures abort before any output is written.
pub fn run(config: &AppConfig) -> Result<RunReport> {
    logging::info(
        Stage::Config,
        None,
        &format!("API key loaded: {}", config.masked_api_key()),
    );

    let client = moenv::build_client(config)?;
    let raw = moenv::fetch_records(&client, config).map_err(|e| {
        logging::error(Stage::Api, None, &e.to_string());
        AqmonError::from(e)
    })?;

    Ok(process(config, &raw, &Local::now()))
}

/// Normalizes, classifies and writes a batch of raw records.
pub fn process(
    config: &AppConfig,
    raw: &[RawRecord],
    generated_at: &DateTime<Local>,
) -> RunReport {
    let normalized = normalize::normalize_all(raw);

    let mut readings = normalized.readings;
    for reading in &mut readings {
        let category = classify::annotate(reading);
        logging::debug(
            Stage::Classify,
            Some(reading.site_id.as_str()),
            &format!("{} -> {}", reading.site_name, category),
        );
    }

    let stats = AqiSummary::from_readings(&readings);
    logging::log_run_summary(
        raw.len(),
        readings.len(),
        normalized.skipped.len(),
        stats.unmapped,
    );

    if readings.is_empty() {
        logging::warn(Stage::System, None, "No usable station records in this run");
    }

    if let Some((nearest, km)) = summary::nearest_to(TAIPEI_MAIN_STATION, &readings) {
        logging::info(
            Stage::System,
            Some(nearest.site_id.as_str()),
            &format!(
                "Nearest station to Taipei Main Station: {} ({:.1} km, AQI {})",
                nearest.site_name,
                km,
                nearest
                    .aqi
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            ),
        );
    }

    let outputs = output::write_all(config, &readings, &stats, generated_at);

    RunReport {
        fetched: raw.len(),
        readings,
        skipped: normalized.skipped,
        summary: stats,
        outputs,
    }
}
