use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Sign in to save titles")]
    Unauthenticated,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    #[error("Remote read failed: {0}")]
    RemoteRead(String),

    #[error("Remote call timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a read that failed with this error may be attempted again.
    ///
    /// Caller mistakes and auth failures never succeed on a second try.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::RemoteRead(_)
            | AppError::Timeout(_)
            | AppError::ExternalApi(_)
            | AppError::HttpClient(_) => true,
            AppError::Unauthenticated
            | AppError::Auth(_)
            | AppError::RemoteWrite(_)
            | AppError::NotFound(_)
            | AppError::InvalidInput(_)
            | AppError::Internal(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::RemoteWrite(_) | AppError::RemoteRead(_) | AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_failures_are_retryable() {
        assert!(AppError::RemoteRead("503".to_string()).is_retryable());
        assert!(AppError::Timeout(5000).is_retryable());
        assert!(AppError::ExternalApi("bad gateway".to_string()).is_retryable());
    }

    #[test]
    fn test_caller_errors_are_not_retryable() {
        assert!(!AppError::Unauthenticated.is_retryable());
        assert!(!AppError::InvalidInput("empty".to_string()).is_retryable());
        assert!(!AppError::RemoteWrite("conflict".to_string()).is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::RemoteWrite("rejected".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Timeout(100).into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::InvalidInput("q".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
