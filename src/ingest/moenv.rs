/// MOENV (Ministry of Environment, Taiwan) open-data API client
///
/// Retrieves the latest AQI reading for every air-quality monitoring
/// station in a single request. No retries, no pagination: one page of up
/// to `limit` records is fetched and the run continues with whatever came
/// back.
///
/// API Documentation: https://data.moenv.gov.tw/en/dataset/detail/AQX_P_432

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{ApiError, FetchError};
use crate::logging::{self, Stage};
use crate::model::RawRecord;

// ============================================================================
// API Response Structures
// ============================================================================

/// The response body. Depending on the endpoint generation the service
/// returns either a bare array of records or an envelope around them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AqiResponse {
    Records(Vec<Value>),
    Envelope(Envelope),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: Option<bool>,
    message: Option<String>,
    records: Option<Value>,
}

// ============================================================================
// API Client Functions
// ============================================================================

/// The dataset endpoint, without query parameters.
pub fn endpoint(config: &AppConfig) -> String {
    format!("{}/{}", config.base_url.trim_end_matches('/'), config.dataset)
}

/// Query parameters for one request: key, record limit and format.
pub fn query_params(config: &AppConfig) -> [(&'static str, String); 3] {
    [
        ("api_key", config.api_key.clone()),
        ("limit", config.limit.to_string()),
        ("format", "JSON".to_string()),
    ]
}

/// The request URL with the key masked, for log lines and error messages.
pub fn display_url(config: &AppConfig) -> String {
    format!(
        "{}?api_key={}&limit={}&format=JSON",
        endpoint(config),
        config.masked_api_key(),
        config.limit
    )
}

/// A blocking client with the configured connect and total timeouts.
pub fn build_client(config: &AppConfig) -> Result<Client, FetchError> {
    if config.insecure_tls {
        logging::warn(
            Stage::Api,
            None,
            "TLS certificate verification is disabled for the API endpoint",
        );
    }

    Client::builder()
        .connect_timeout(config.timeout)
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.insecure_tls)
        .build()
        .map_err(|source| FetchError::Network {
            url: config.base_url.clone(),
            source,
        })
}

/// Fetch the current station records
///
/// # Errors
/// - `FetchError::Network` on connection failure, timeout, or a body that
///   could not be read.
/// - `FetchError::Api` on a non-2xx status or an unusable payload.
pub fn fetch_records(client: &Client, config: &AppConfig) -> Result<Vec<RawRecord>, FetchError> {
    let shown_url = display_url(config);
    logging::info(
        Stage::Api,
        None,
        &format!("Fetching air quality data from {}", shown_url),
    );

    let network = |source: reqwest::Error| FetchError::Network {
        url: shown_url.clone(),
        source: source.without_url(),
    };

    let response = client
        .get(endpoint(config))
        .query(&query_params(config))
        .header("Accept", "application/json")
        .send()
        .map_err(&network)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::HttpStatus(status.as_u16()).into());
    }

    let body = response.text().map_err(&network)?;
    let records = parse_response(&body)?;

    logging::info(
        Stage::Api,
        None,
        &format!("Received {} station records", records.len()),
    );
    Ok(records)
}

/// Parse a response body into raw records
///
/// Accepts a bare JSON array, or an object with a `records` array. An
/// envelope with `success: false` is a service-side rejection.
pub fn parse_response(body: &str) -> Result<Vec<RawRecord>, ApiError> {
    let response: AqiResponse = serde_json::from_str(body).map_err(|e| {
        ApiError::Malformed(format!("response is not a JSON array or object: {}", e))
    })?;

    let values = match response {
        AqiResponse::Records(values) => values,
        AqiResponse::Envelope(envelope) => {
            if envelope.success == Some(false) {
                return Err(ApiError::Rejected(
                    envelope.message.unwrap_or_else(|| "unknown error".to_string()),
                ));
            }
            match envelope.records {
                Some(Value::Array(values)) => values,
                Some(_) => {
                    return Err(ApiError::Malformed("\"records\" is not an array".to_string()));
                }
                None => {
                    return Err(ApiError::Malformed("missing \"records\" field".to_string()));
                }
            }
        }
    };

    Ok(values.into_iter().map(RawRecord::from).collect())
}

// ============================================================================
// Tests
// ============================================================================
