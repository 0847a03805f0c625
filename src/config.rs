//! Runtime configuration.
//!
//! `AppConfig` is built once at startup and handed by reference to the API
//! client, the pipeline and the output writers. Values come from, in order of
//! increasing precedence: built-in defaults, an optional TOML file named by
//! `AQMON_CONFIG`, and the process environment (after `.env` is loaded).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A required setting and the environment names accepted for it, in order.
pub struct RequiredKey {
    pub name: &'static str,
    pub env_names: &'static [&'static str],
}

/// Every setting that must be present before the run may start.
pub const REQUIRED_KEYS: &[RequiredKey] = &[RequiredKey {
    name: "MOENV_API_KEY",
    env_names: &["MOENV_API_KEY", "API_KEY"],
}];

pub const ENV_CONFIG_FILE: &str = "AQMON_CONFIG";
pub const ENV_BASE_URL: &str = "AQMON_BASE_URL";
pub const ENV_DATASET: &str = "AQMON_DATASET";
pub const ENV_LIMIT: &str = "AQMON_LIMIT";
pub const ENV_TIMEOUT_SECS: &str = "AQMON_TIMEOUT_SECS";
pub const ENV_OUTPUT_DIR: &str = "AQMON_OUTPUT_DIR";
pub const ENV_LOG_LEVEL: &str = "AQMON_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "AQMON_LOG_FILE";
pub const ENV_INSECURE_TLS: &str = "AQMON_INSECURE_TLS";

pub const DEFAULT_BASE_URL: &str = "https://data.moenv.gov.tw/api/v2";
/// Real-time AQI for all monitoring stations.
pub const DEFAULT_DATASET: &str = "aqx_p_432";
pub const DEFAULT_LIMIT: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Non-secret settings that may live in a TOML file.
///
/// ```toml
/// base_url = "https://data.moenv.gov.tw/api/v2"
/// limit = 500
/// output_dir = "outputs"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub base_url: Option<String>,
    pub dataset: Option<String>,
    pub limit: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub insecure_tls: Option<bool>,
}

impl FileSettings {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&text, path)
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub dataset: String,
    /// Maximum number of station records requested in the single API call.
    pub limit: u32,
    pub timeout: Duration,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// Skip TLS certificate verification for the API endpoint.
    pub insecure_tls: bool,
}

impl AppConfig {
    /// Loads `.env`, the optional settings file, and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let lookup = |key: &str| std::env::var(key).ok();
        let file = match lookup(ENV_CONFIG_FILE).filter(|p| !p.trim().is_empty()) {
            Some(path) => FileSettings::read(Path::new(&path))?,
            None => FileSettings::default(),
        };

        Self::from_sources(file, lookup)
    }

    /// Builds a config from a settings file and an environment lookup.
    ///
    /// `lookup` stands in for `std::env::var` so tests never touch the real
    /// process environment.
    pub fn from_sources<F>(file: FileSettings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut api_key = None;
        for required in REQUIRED_KEYS {
            let value = required.env_names.iter().find_map(|&name| env(name));
            match value {
                Some(v) => api_key = Some(v.trim().to_string()),
                None => return Err(ConfigError::MissingKey { key: required.name }),
            }
        }
        let api_key = api_key.ok_or(ConfigError::MissingKey {
            key: REQUIRED_KEYS[0].name,
        })?;

        let limit = match env(ENV_LIMIT) {
            Some(v) => parse_value(ENV_LIMIT, &v)?,
            None => file.limit.unwrap_or(DEFAULT_LIMIT),
        };
        let timeout_secs = match env(ENV_TIMEOUT_SECS) {
            Some(v) => parse_value(ENV_TIMEOUT_SECS, &v)?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let insecure_tls = match env(ENV_INSECURE_TLS) {
            Some(v) => parse_bool(ENV_INSECURE_TLS, &v)?,
            None => file.insecure_tls.unwrap_or(false),
        };

        let config = AppConfig {
            api_key,
            base_url: env(ENV_BASE_URL)
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            dataset: env(ENV_DATASET)
                .or(file.dataset)
                .unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            limit,
            timeout: Duration::from_secs(timeout_secs),
            output_dir: env(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            log_level: env(ENV_LOG_LEVEL)
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            log_file: env(ENV_LOG_FILE).map(PathBuf::from).or(file.log_file),
            insecure_tls,
        };

        config.validate()?;
        Ok(config)
    }

    /// The single validation point for every setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey {
                key: REQUIRED_KEYS[0].name,
            });
        }
        if self.limit == 0 {
            return Err(invalid(ENV_LIMIT, "0", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(invalid(ENV_TIMEOUT_SECS, "0", "must be at least 1"));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(invalid(ENV_BASE_URL, &self.base_url, "must be an http(s) URL"));
        }
        if self.dataset.trim().is_empty() || self.dataset.contains('/') {
            return Err(invalid(ENV_DATASET, &self.dataset, "must be a bare dataset id"));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(invalid(
                ENV_LOG_LEVEL,
                &self.log_level,
                "expected one of trace, debug, info, warn, error",
            ));
        }
        Ok(())
    }

    /// The API key with everything after the first 8 characters hidden.
    pub fn masked_api_key(&self) -> String {
        let prefix: String = self.api_key.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, &e.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
