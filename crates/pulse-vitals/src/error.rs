//! Error types for vital sign estimation.

use thiserror::Error;

/// Errors produced while turning a sample window into an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimationError {
    /// The window holds fewer valid samples than the estimator requires.
    #[error("Insufficient samples: need at least {required}, got {got}")]
    InsufficientSamples {
        got: usize,
        required: usize,
    },

    /// The averaged IR channel is zero, so the red/IR ratio is undefined.
    #[error("Division by zero: average IR intensity is 0")]
    DivisionByZero,
}

/// Result alias for estimation operations.
pub type EstimationResult<T> = Result<T, EstimationError>;
