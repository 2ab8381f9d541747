//! Error types for row indexing.

use std::path::PathBuf;

use thiserror::Error;

/// A row (or one column of a row) that could not be mapped into the index.
///
/// Reported per row; never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowMappingError {
    /// A reserved metadata column is absent or blank.
    #[error("row {row}: missing or blank metadata column '{column}'")]
    MissingColumn { row: usize, column: String },

    /// A dynamic column name could not be decomposed into path segments.
    #[error("row {row}: malformed column name '{column}': {reason}")]
    MalformedColumn {
        row: usize,
        column: String,
        reason: String,
    },
}

impl RowMappingError {
    /// 1-based position of the offending row in its source.
    pub fn row(&self) -> usize {
        match self {
            Self::MissingColumn { row, .. } | Self::MalformedColumn { row, .. } => *row,
        }
    }

    /// Whether the whole row was skipped (as opposed to a single column).
    pub fn skips_row(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }
}

/// Failure while reading rows from a row source.
#[derive(Debug, Error)]
pub enum RowSourceError {
    #[error("failed to read rows from {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[cfg(feature = "polars")]
    #[error("failed to read DataFrame column '{column}': {message}")]
    DataFrame { column: String, message: String },
}
