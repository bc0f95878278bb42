use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::Envelope;

/// An error raised by a key-value store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the command.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// An error raised by the session and CSRF managers.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The session is absent or expired.
    #[error("Session not found")]
    SessionNotFound,

    /// The CSRF token is absent or expired.
    #[error("CSRF token not found")]
    TokenNotFound,

    /// The CSRF token is bound to another identity.
    #[error("CSRF token does not belong to the caller")]
    TokenMismatch,

    /// The store failed or did not answer before the deadline.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for ManagerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => ManagerError::StoreUnavailable(msg),
        }
    }
}

/// A typed error returned by a downstream service client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The requested record does not exist.
    #[error("Record not found")]
    NotFound,

    /// The caller may not perform this operation.
    #[error("Operation forbidden")]
    Forbidden,

    /// The arguments were rejected by the service.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The service could not be reached or timed out.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// The gateway's error taxonomy.
#[derive(Error, Debug)]
pub enum AppError {
    /// A session, token or record is absent or expired.
    #[error("Resource not found")]
    NotFound,

    /// The caller has no valid session.
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller is known but the operation is not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request body or parameters are malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A store or downstream service is unreachable or timed out.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// An unexpected failure.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// The category reported in the error envelope.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound => AppError::NotFound,
            ServiceError::Forbidden => AppError::Forbidden("Operation not allowed".to_string()),
            ServiceError::InvalidInput(msg) => AppError::InvalidInput(msg),
            ServiceError::Unavailable(msg) => AppError::Unavailable(msg),
        }
    }
}

impl From<ManagerError> for AppError {
    fn from(e: ManagerError) -> Self {
        match e {
            ManagerError::SessionNotFound | ManagerError::TokenNotFound => AppError::NotFound,
            ManagerError::TokenMismatch => {
                AppError::Forbidden("CSRF token does not match session".to_string())
            }
            ManagerError::StoreUnavailable(msg) => AppError::Unavailable(msg),
        }
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        AppError::InvalidInput(report.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let category = self.category();
        let (status, message) = match self {
            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Unauthenticated => {
                tracing::warn!("Authentication required");
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }

            AppError::Forbidden(ref msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, msg.clone())
            }

            AppError::InvalidInput(ref msg) => {
                tracing::debug!("Invalid input: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Unavailable(ref msg) => {
                tracing::error!("Dependency unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Envelope::error(category, message)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_become_unavailable() {
        let err: AppError = ServiceError::Unavailable("connect refused".into()).into();
        assert_eq!(err.category(), "unavailable");

        let err: AppError = ManagerError::StoreUnavailable("timeout".into()).into();
        assert_eq!(err.category(), "unavailable");
    }

    #[test]
    fn unavailable_response_hides_details() {
        let response = AppError::Unavailable("redis://10.0.0.7:6379 refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
