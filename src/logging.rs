/// Structured logging for the AQI pipeline
///
/// Every event carries the pipeline stage it came from and, where relevant,
/// the station it concerns. Output goes to the console and optionally to an
/// appended log file, on top of `tracing`.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{OutputError, RecordError};

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Api,
    Normalize,
    Classify,
    Output,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "CONFIG"),
            Stage::Api => write!(f, "API"),
            Stage::Normalize => write!(f, "NORM"),
            Stage::Classify => write!(f, "CLASS"),
            Stage::Output => write!(f, "OUT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Safe to call more than once;
/// later calls are ignored.
pub fn init_logger(level: &str, log_file: Option<&Path>, console_timestamps: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let console = if console_timestamps {
        console
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S UTC".to_string()))
            .boxed()
    } else {
        console.without_time().boxed()
    };

    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S UTC".to_string()))
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();
}

// ---------------------------------------------------------------------------
// Public logging functions
// ---------------------------------------------------------------------------

pub fn info(stage: Stage, site_id: Option<&str>, message: &str) {
    match site_id {
        Some(site) => tracing::info!(stage = %stage, site, "{}", message),
        None => tracing::info!(stage = %stage, "{}", message),
    }
}

pub fn warn(stage: Stage, site_id: Option<&str>, message: &str) {
    match site_id {
        Some(site) => tracing::warn!(stage = %stage, site, "{}", message),
        None => tracing::warn!(stage = %stage, "{}", message),
    }
}

pub fn error(stage: Stage, site_id: Option<&str>, message: &str) {
    match site_id {
        Some(site) => tracing::error!(stage = %stage, site, "{}", message),
        None => tracing::error!(stage = %stage, "{}", message),
    }
}

pub fn debug(stage: Stage, site_id: Option<&str>, message: &str) {
    match site_id {
        Some(site) => tracing::debug!(stage = %stage, site, "{}", message),
        None => tracing::debug!(stage = %stage, "{}", message),
    }
}

// ---------------------------------------------------------------------------
// Structured failure logging
// ---------------------------------------------------------------------------

/// Log a record dropped by the normalizer. `index` is its position in the response.
pub fn log_record_skip(index: usize, err: &RecordError) {
    warn(
        Stage::Normalize,
        None,
        &format!("Skipping record #{}: {}", index, err),
    );
}

pub fn log_output_failure(err: &OutputError) {
    error(
        Stage::Output,
        None,
        &format!("{} output failed: {}", err.kind(), err),
    );
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Severity of the end-of-run summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLevel {
    Info,
    Warning,
    Error,
}

/// Info when nothing was lost, error when nothing was usable, warn otherwise.
pub fn summary_level(total: usize, kept: usize, skipped: usize) -> SummaryLevel {
    if skipped == 0 {
        SummaryLevel::Info
    } else if kept == 0 && total > 0 {
        SummaryLevel::Error
    } else {
        SummaryLevel::Warning
    }
}

pub fn log_run_summary(total: usize, kept: usize, skipped: usize, unmapped: usize) {
    let message = format!(
        "Processed {}/{} station records, {} skipped, {} without usable coordinates (left off the map)",
        kept, total, skipped, unmapped
    );

    match summary_level(total, kept, skipped) {
        SummaryLevel::Info => info(Stage::System, None, &message),
        SummaryLevel::Warning => warn(Stage::System, None, &message),
        SummaryLevel::Error => error(Stage::System, None, &message),
    }
}
