//! CSV output: a header row, then one row per station in data-model column order.

use std::io::Write;
use std::path::Path;

use crate::error::OutputError;
use crate::model::StationReading;
use crate::output::{OutputKind, write_atomically};

/// Column names, in the order they are written.
pub const COLUMNS: [&str; 13] = [
    "site_id",
    "site_name",
    "county",
    "latitude",
    "longitude",
    "aqi",
    "pm25",
    "status",
    "color",
    "pollutant",
    "publish_time",
    "wind_speed",
    "wind_direction",
];

pub fn write_csv<W: Write>(writer: W, readings: &[StationReading]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    // Written by hand so an empty run still gets a header row.
    wtr.write_record(COLUMNS)?;
    for reading in readings {
        wtr.serialize(reading)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save(path: &Path, readings: &[StationReading]) -> Result<(), OutputError> {
    write_atomically(OutputKind::Csv, path, |w| {
        write_csv(w, readings).map_err(|e| {
            if e.is_io_error() {
                match e.into_kind() {
                    csv::ErrorKind::Io(source) => OutputError::Io {
                        kind: OutputKind::Csv,
                        path: path.to_path_buf(),
                        source,
                    },
                    other => OutputError::Encode {
                        kind: OutputKind::Csv,
                        message: format!("{:?}", other),
                    },
                }
            } else {
                OutputError::Encode {
                    kind: OutputKind::Csv,
                    message: e.to_string(),
                }
            }
        })
    })
}
