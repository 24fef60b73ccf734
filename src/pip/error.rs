//! Errors raised while loading boundary data.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce the boundary list. Lookups never fail for any
/// other reason: a point outside every ring is a valid `None` result.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The data file could not be opened or read.
    #[error("failed to read boundary data from {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A non-empty line does not follow `CODE=TYPE (coordinates)`.
    #[error("malformed boundary record on line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl BoundaryError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        BoundaryError::Parse {
            line,
            reason: reason.into(),
        }
    }
}
