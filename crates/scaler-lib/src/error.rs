//! Error types for the decision engine

use thiserror::Error;

/// Errors returned by a decision call
///
/// None of these are retried inside the engine. The caller skips applying
/// any decision and tries again on the next reconciliation.
#[derive(Debug, Error)]
pub enum ScalingError {
    /// A required denominator (requests, target utilization, a bound) is zero,
    /// or an input value is otherwise unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The persisted learning state could not be decoded or encoded
    #[error("learning state serialization failed: {0}")]
    Serialization(String),

    /// A hybrid step would leave the workload without replicas
    #[error("boundary exhausted: {0}")]
    BoundaryExhaustion(String),
}

impl ScalingError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ScalingError::InvalidInput(message.into())
    }

    /// Short machine-readable kind, used as a metric label and in API errors
    pub fn kind(&self) -> &'static str {
        match self {
            ScalingError::InvalidInput(_) => "invalid_input",
            ScalingError::Serialization(_) => "serialization",
            ScalingError::BoundaryExhaustion(_) => "boundary_exhaustion",
        }
    }
}

impl From<serde_json::Error> for ScalingError {
    fn from(err: serde_json::Error) -> Self {
        ScalingError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScalingError>;
