//! JSON output: a pretty-printed array, keys in data-model order.

use std::io::Write;
use std::path::Path;

use crate::error::OutputError;
use crate::model::StationReading;
use crate::output::{OutputKind, write_atomically};

pub fn write_json<W: Write>(writer: W, readings: &[StationReading]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, readings)
}

pub fn save(path: &Path, readings: &[StationReading]) -> Result<(), OutputError> {
    write_atomically(OutputKind::Json, path, |w| {
        write_json(&mut *w, readings).map_err(|e| {
            if e.is_io() {
                OutputError::Io {
                    kind: OutputKind::Json,
                    path: path.to_path_buf(),
                    source: e.into(),
                }
            } else {
                OutputError::Encode {
                    kind: OutputKind::Json,
                    message: e.to_string(),
                }
            }
        })?;
        w.write_all(b"\n").map_err(|source| OutputError::Io {
            kind: OutputKind::Json,
            path: path.to_path_buf(),
            source,
        })
    })
}
