//! Error taxonomy for the AQI pipeline.
//!
//! Configuration, network and API errors are fatal and abort the run.
//! Record errors are recovered inside the normalizer and output errors are
//! reported per writer; neither of those stops the run.

use std::path::PathBuf;
use thiserror::Error;

use crate::output::OutputKind;

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// None of the accepted names for a required key is set (or all are blank).
    #[error("missing required setting {key} (set it in the environment or in .env)")]
    MissingKey { key: &'static str },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("could not read config file '{path}': {reason}")]
    File { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, or a body that could not be read.
    #[error("network error contacting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// The service answered, but not with something usable.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("service reported failure: {0}")]
    Rejected(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Recoverable errors
// ---------------------------------------------------------------------------

/// Why one record was dropped during normalization.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record for '{site_name}' has no site id")]
    MissingSiteId { site_name: String },
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {kind} output '{path}': {source}")]
    Io {
        kind: OutputKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {kind} output: {message}")]
    Encode { kind: OutputKind, message: String },
}

impl OutputError {
    pub fn kind(&self) -> OutputKind {
        match self {
            OutputError::Io { kind, .. } | OutputError::Encode { kind, .. } => *kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Errors that end a run with a non-zero exit code.
#[derive(Debug, Error)]
pub enum AqmonError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{failed} of 3 outputs could not be written")]
    Output { failed: usize },
}

impl AqmonError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AqmonError::Config(_) => 2,
            AqmonError::Fetch(FetchError::Network { .. }) => 3,
            AqmonError::Fetch(FetchError::Api(_)) => 4,
            AqmonError::Output { .. } => 5,
        }
    }

    /// A one-line hint for the operator, printed after the error itself.
    pub fn user_hint(&self) -> &'static str {
        match self {
            AqmonError::Config(ConfigError::MissingKey { .. }) => {
                "Set MOENV_API_KEY (or API_KEY) in .env, e.g. MOENV_API_KEY=your_api_key_here"
            }
            AqmonError::Config(ConfigError::InvalidValue { .. }) => {
                "Fix the named setting in the environment, .env, or the AQMON_CONFIG file"
            }
            AqmonError::Config(ConfigError::File { .. }) => {
                "Check the AQMON_CONFIG path and that the file is valid TOML"
            }
            AqmonError::Fetch(FetchError::Network { .. }) => {
                "Check network connectivity, DNS resolution of data.moenv.gov.tw, and any proxy or firewall"
            }
            AqmonError::Fetch(FetchError::Api(_)) => {
                "The API rejected the request or changed its format; check the API key and dataset id"
            }
            AqmonError::Output { .. } => "Check that the output directory is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, AqmonError>;
