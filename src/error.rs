//! Error types for Mind City Flux

use thiserror::Error;

/// Errors that can occur during computation
///
/// The classifier and score normalizer only ever return [`ComputeError::InvalidInput`].
/// The remaining variants come from the wire decoding and encoding layers.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse message batch: {0}")]
    ParseError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ComputeError {
    pub(crate) fn missing(field: &str) -> Self {
        ComputeError::InvalidInput(format!("missing required field `{field}`"))
    }

    pub(crate) fn non_finite(field: &str, value: f64) -> Self {
        ComputeError::InvalidInput(format!("field `{field}` must be finite, got {value}"))
    }

    /// True when the error is the input-contract violation kind
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ComputeError::InvalidInput(_))
    }
}
