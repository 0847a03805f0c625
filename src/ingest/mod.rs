/// Upstream data sources.
///
/// - `moenv` — Taiwan Ministry of Environment open-data AQI endpoint.

pub mod moenv;
