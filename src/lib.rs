//! `aqmon` - Taiwan air-quality station snapshot
//!
//! Fetches the latest AQI reading for every MOENV monitoring station,
//! classifies each reading into a health-risk band, and writes the results
//! as CSV, JSON, and an interactive HTML map.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;

pub use classify::{AqiCategory, annotate, classify};
pub use config::AppConfig;
pub use error::{AqmonError, Result};
pub use model::{RawRecord, StationReading};
pub use pipeline::{RunReport, process, run};
