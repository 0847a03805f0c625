/// Data shaping for the AQI pipeline.
///
/// Submodules:
/// - `normalize` — turns loosely-typed API records into `StationReading`s.
/// - `summary` — run statistics, distances, and the console preview.

pub mod normalize;
pub mod summary;
