//! Output writers: CSV, JSON, and an interactive HTML map.
//!
//! The three writers are independent. Each one writes to a temporary file in
//! the output directory and renames it into place when complete, so an
//! interrupted run never leaves a half-written file under a final name. A
//! failure in one writer is logged and reported; the others still run.

pub mod csv_writer;
pub mod json_writer;
pub mod map;

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::analysis::summary::AqiSummary;
use crate::config::AppConfig;
use crate::error::OutputError;
use crate::logging::{self, Stage};
use crate::model::StationReading;

// ---------------------------------------------------------------------------
// Kinds and paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Csv,
    Json,
    Map,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Csv => write!(f, "CSV"),
            OutputKind::Json => write!(f, "JSON"),
            OutputKind::Map => write!(f, "map"),
        }
    }
}

/// File names for one run, all stamped with the same generation time.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub map: PathBuf,
}

impl OutputPaths {
    pub const TIMESTAMP_FORMAT: &'static str = "%Y%m%d_%H%M%S";

    pub fn for_run(dir: &Path, generated_at: &DateTime<Local>) -> Self {
        let stamp = generated_at.format(Self::TIMESTAMP_FORMAT);
        OutputPaths {
            csv: dir.join(format!("aqi_data_{}.csv", stamp)),
            json: dir.join(format!("aqi_data_{}.json", stamp)),
            map: dir.join(format!("aqi_map_{}.html", stamp)),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened to each output of a run.
#[derive(Debug, Default)]
pub struct OutputReport {
    pub results: Vec<(OutputKind, Result<PathBuf, OutputError>)>,
}

impl OutputReport {
    pub fn written(&self) -> Vec<&Path> {
        self.results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok().map(PathBuf::as_path))
            .collect()
    }

    pub fn failures(&self) -> Vec<&OutputError> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().err()).collect()
    }

    pub fn path_of(&self, kind: OutputKind) -> Option<&Path> {
        self.results
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, r)| r.as_ref().ok().map(PathBuf::as_path))
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Writes a file through a temporary sibling that is renamed into place.
pub(crate) fn write_atomically<F>(kind: OutputKind, path: &Path, write: F) -> Result<(), OutputError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), OutputError>,
{
    let io_error = |source: std::io::Error| OutputError::Io {
        kind,
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush().map_err(io_error)?;
    }
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// Attempts all three outputs and reports each outcome.
pub fn write_all(
    config: &AppConfig,
    readings: &[StationReading],
    summary: &AqiSummary,
    generated_at: &DateTime<Local>,
) -> OutputReport {
    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        // Each writer will fail and report on its own.
        logging::error(
            Stage::Output,
            None,
            &format!(
                "Could not create output directory {}: {}",
                config.output_dir.display(),
                e
            ),
        );
    }

    let paths = OutputPaths::for_run(&config.output_dir, generated_at);
    let mut report = OutputReport::default();

    let csv = csv_writer::save(&paths.csv, readings).map(|_| paths.csv.clone());
    report.results.push((OutputKind::Csv, csv));

    let json = json_writer::save(&paths.json, readings).map(|_| paths.json.clone());
    report.results.push((OutputKind::Json, json));

    let html = map::save(&paths.map, readings, summary, generated_at).map(|_| paths.map.clone());
    report.results.push((OutputKind::Map, html));

    for (kind, result) in &report.results {
        match result {
            Ok(path) => logging::info(
                Stage::Output,
                None,
                &format!("{} saved to {}", kind, path.display()),
            ),
            Err(e) => logging::log_output_failure(e),
        }
    }

    report
}
