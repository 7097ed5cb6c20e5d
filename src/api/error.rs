//! API Error Types
//!
//! Maps domain and SDK failures onto HTTP status codes and the JSON error
//! envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::dashboard::{ChartError, FilterError};
use crate::domain::DomainError;
use crate::sdk::SdkError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role may not do this
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (back end down)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SdkError> for ApiError {
    fn from(err: SdkError) -> Self {
        let message = err.to_string();
        match err {
            SdkError::InvalidCredentials | SdkError::InvalidToken => ApiError::Unauthorized(message),
            SdkError::EmailExists(_) => ApiError::Conflict(message),
            SdkError::WeakPassword(_) => ApiError::Validation(message),
            SdkError::NotFound { .. } => ApiError::NotFound(message),
            SdkError::Unavailable | SdkError::Timeout | SdkError::Request(_) => {
                ApiError::ServiceUnavailable(message)
            }
            _ => ApiError::Internal(message),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(m) => ApiError::NotFound(m),
            DomainError::Validation(m) => ApiError::Validation(m),
            DomainError::Conflict(m) => ApiError::Conflict(m),
            DomainError::Forbidden(m) => ApiError::Forbidden(m),
            DomainError::Export(m) => ApiError::Internal(m),
            DomainError::Sdk(e) => e.into(),
            DomainError::Aggregate(e) => e.into(),
        }
    }
}

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::MonthNotFound(_) | FilterError::WeekNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            _ => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<ChartError> for ApiError {
    fn from(err: ChartError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(request_id = %request_id, error_code = %code, error_message = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MonthKey;

    #[test]
    fn test_domain_errors_map_to_status() {
        let cases = [
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::Sdk(SdkError::InvalidToken), StatusCode::UNAUTHORIZED),
            (DomainError::Sdk(SdkError::EmailExists("a@b.c".into())), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_and_code().0, status);
        }
    }

    #[test]
    fn test_filter_errors() {
        let month = MonthKey::new(2024, 5).unwrap();
        assert!(matches!(ApiError::from(FilterError::MonthNotFound(month)), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from(FilterError::NoMonthSelected), ApiError::Validation(_)));
    }

    #[test]
    fn test_error_response_status() {
        let response = ApiError::Forbidden("owners only".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
