//! Error types for the tsframe adapter layer

use thiserror::Error;

/// Result type alias for tsframe operations
pub type Result<T> = std::result::Result<T, TsFrameError>;

/// Main error type for the tsframe adapter
///
/// All variants are data-correctness errors: unrecoverable at the point of
/// detection and surfaced to the caller immediately, never repaired silently.
#[derive(Error, Debug)]
pub enum TsFrameError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Non-uniform time index for entity {item}: {reason}")]
    NonUniformTimeIndex { item: String, reason: String },

    #[error("Static feature column {column} is not constant within entity {item}")]
    InconsistentStaticFeature { column: String, item: String },

    #[error("Feature length mismatch in column {column}: expected {expected}, got {actual}")]
    FeatureLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Truncation overflow: cannot drop {requested} steps from a target of length {available}")]
    TruncationOverflow { requested: usize, available: usize },

    #[error("Frequency error: {0}")]
    FrequencyError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for TsFrameError {
    fn from(err: polars::error::PolarsError) -> Self {
        TsFrameError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TsFrameError {
    fn from(err: ndarray::ShapeError) -> Self {
        TsFrameError::DataError(err.to_string())
    }
}
