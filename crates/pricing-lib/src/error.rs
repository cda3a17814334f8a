//! Domain errors surfaced to callers of the prediction engine
//!
//! Learned-model unavailability is deliberately absent here: it is recovered
//! inside the engine and reported through `ModelUsed`, never as an error.

use thiserror::Error;

/// Errors returned by the prediction engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// One or more required feature fields were not supplied
    #[error("Required fields missing: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// A supplied field is outside its accepted range
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("No properties provided for prediction")]
    EmptyBatch,

    #[error("Maximum {max} properties allowed per batch request, got {actual}")]
    BatchTooLarge { max: usize, actual: usize },

    /// The computation produced a value that cannot be reported
    #[error("Prediction failed: {0}")]
    Computation(String),
}

impl PredictError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the engine
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictError::Computation(_))
    }
}
