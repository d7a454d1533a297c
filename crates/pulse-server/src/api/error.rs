//! API error type and its JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::MonitorError;

/// Errors a handler can return.
///
/// Read-cycle failures never surface here: they are absorbed into the
/// fail-safe snapshot before the handler sees them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Another read holds the sensors and the busy policy is `reject` (503).
    #[error("Service busy: {message}")]
    Busy {
        message: String,
    },

    /// The blocking read task died (500).
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Busy { .. } => "BUSY",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::Busy => Self::Busy {
                message: "a sensor read is already in progress, retry shortly".to_string(),
            },
            other => Self::internal(other.to_string()),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal { .. } => tracing::error!(error = %self, "API error"),
            ApiError::Busy { .. } => tracing::warn!(error = %self, "API error"),
        }

        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_maps_to_503() {
        let err: ApiError = MonitorError::Busy.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "BUSY");
    }

    #[test]
    fn other_monitor_errors_are_internal() {
        let err: ApiError = MonitorError::DivisionByZero.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
