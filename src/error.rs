//! Error types for the admissions-decompose library.

use thiserror::Error;

/// Result type alias for decomposition operations.
pub type Result<T> = std::result::Result<T, DecompositionError>;

/// Errors that can occur while aggregating, transforming or decomposing series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecompositionError {
    /// A date or period string did not match the stated format.
    #[error("format error: '{value}' does not match format '{format}'")]
    Format { value: String, format: String },

    /// A non-positive value was fed to the power transform.
    #[error("domain error: value {value} at index {index} must be strictly positive")]
    Domain { index: usize, value: f64 },

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Series is too degenerate to fit (e.g. zero variance).
    #[error("degenerate series: {0}")]
    Degenerate(String),

    /// Invalid scope, smoother length, missing group column and similar.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Period-index related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl DecompositionError {
    /// Whether the error is caused by the data of a single group and may be
    /// recovered by imputing that group's series.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Domain { .. }
                | Self::InsufficientData { .. }
                | Self::Degenerate(_)
                | Self::MissingValues
                | Self::ComputationError(_)
        )
    }
}
