use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;
use tracing::debug;

use crate::frame::{unique_headers, Frame};

/// Extraction failures are file-level: the caller gets the error and no
/// frame, and the file is skipped rather than retried.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("input file is empty or has a header only: {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("malformed CSV in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Read one CSV file into a `Frame`. The header row is required and supplies
/// the column names; column kinds are inferred from the data rows.
pub fn read_csv(path: &Path) -> Result<Frame, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }

    let parse = |source: csv::Error| ExtractError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(parse)?;

    let raw_headers: Vec<String> = rdr
        .headers()
        .map_err(parse)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(parse)?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    if rows.is_empty() {
        return Err(ExtractError::EmptyInput(path.to_path_buf()));
    }

    let headers = unique_headers(&raw_headers);
    let frame = Frame::from_records(headers, rows);
    debug!(
        file = %path.display(),
        rows = frame.n_rows(),
        columns = frame.n_cols(),
        "read csv"
    );
    Ok(frame)
}
