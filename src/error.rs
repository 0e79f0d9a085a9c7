//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "regular payment not found",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the table on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                 |
/// |-----------|----------------------|-----------------------------|
/// | 1000–1099 | Validation           | 400 Bad Request             |
/// | 1100–1199 | Auth                 | 401 / 403                   |
/// | 2000–2099 | Not Found            | 404 Not Found               |
/// | 2100–2199 | Integrity            | 409 Conflict                |
/// | 3000–3099 | Server / Storage     | 500 Internal Server Error   |
/// | 3100–3199 | External scheduler   | 502 Bad Gateway             |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Record absent, or the caller does not own it. The two cases are
    /// deliberately indistinguishable.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Job callback carried a job type this service does not know.
    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    /// Missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The store rejected a write due to a data-integrity rule.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Generic persistence failure (connectivity, timeout, decode).
    #[error("storage error: {0}")]
    Storage(String),

    /// The external scheduler refused or failed to create a job.
    #[error("failed to create scheduled job {job_name}")]
    SchedulerCreateFailure {
        /// Job that could not be created.
        job_name: String,
        /// Underlying cause.
        reason: String,
    },

    /// The external scheduler failed to delete a job.
    #[error("failed to delete scheduled job {job_name}")]
    SchedulerDeleteFailure {
        /// Job that could not be deleted.
        job_name: String,
        /// Underlying cause.
        reason: String,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnknownJobType(_) => 1002,
            Self::Unauthorized(_) => 1101,
            Self::Forbidden(_) => 1102,
            Self::NotFound(_) => 2001,
            Self::ConstraintViolation(_) => 2101,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::SchedulerCreateFailure { .. } => 3101,
            Self::SchedulerDeleteFailure { .. } => 3102,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnknownJobType(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ConstraintViolation(_) => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SchedulerCreateFailure { .. } | Self::SchedulerDeleteFailure { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// Diagnostic details attached to the response body, if any.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::SchedulerCreateFailure { reason, .. }
            | Self::SchedulerDeleteFailure { reason, .. } => Some(reason.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, details = ?self.details(), "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_and_absence_share_a_message() {
        let err = GatewayError::NotFound("regular payment");
        assert_eq!(err.to_string(), "regular payment not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn scheduler_failures_carry_details() {
        let err = GatewayError::SchedulerCreateFailure {
            job_name: "regular-payment-apply-1".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.details().as_deref(), Some("HTTP 503"));
    }

    #[test]
    fn into_response_sets_status() {
        let response = GatewayError::ConstraintViolation("fk".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
