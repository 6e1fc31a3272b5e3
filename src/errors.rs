use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Any fatal failure in the pipeline: reference-table parsing, batch decoding,
/// or report writing. Missing input files are handled before the pipeline runs
/// and never reach this type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("error reading reference table: {0}")]
    Csv(#[from] csv::Error),
    #[error("{}:{line}: malformed transaction record: {source}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("error encoding report row: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
