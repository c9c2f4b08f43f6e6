//! CSV reading for the importers.
//!
//! Files are read eagerly and in full before any store write, so a
//! structurally broken file aborts an import before it can touch the
//! database.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::ImportError;

/// Reads a whole CSV file, returning its header record and data rows.
///
/// # Errors
///
/// Returns [`ImportError::Open`] when the file cannot be opened and
/// [`ImportError::Read`] when any record is structurally malformed.
pub(crate) fn read_rows(
    path: &Path,
) -> Result<(csv::StringRecord, Vec<csv::StringRecord>), ImportError> {
    let file = File::open(path).map_err(|e| ImportError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::None)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Read {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(record);
    }

    Ok((headers, rows))
}
