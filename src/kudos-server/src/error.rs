//! Error types for the webhook server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kudos_slack::{AuthError, CredentialError, SlackError};
use thiserror::Error;
use tracing::{error, warn};

/// Application error type.
///
/// Responses carry only a status code. Details go to the log, never to the
/// caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request could not be authenticated.
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// An authentic request whose payload could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials for the event's workspace could not be obtained.
    #[error("Credentials unavailable: {0}")]
    Credentials(#[from] CredentialError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Credentials(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication_failed",
            Self::BadRequest(_) => "bad_request",
            Self::Credentials(CredentialError::NotFound(_)) => "workspace_not_installed",
            Self::Credentials(CredentialError::Unavailable(_)) => "credentials_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "Request failed");
        } else {
            warn!(code = self.error_code(), error = %self, "Request rejected");
        }
        status.into_response()
    }
}

/// Result type for the webhook server.
pub type AppResult<T> = Result<T, AppError>;

impl From<SlackError> for AppError {
    fn from(error: SlackError) -> Self {
        match error {
            SlackError::Auth(e) => Self::Authentication(e),
            SlackError::Parse(msg) => Self::BadRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Authentication(AuthError::InvalidSignature).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("bad json".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Credentials(CredentialError::NotFound("T1".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Authentication(AuthError::BadMethod).error_code(),
            "authentication_failed"
        );
        assert_eq!(
            AppError::Credentials(CredentialError::Unavailable("down".into())).error_code(),
            "credentials_unavailable"
        );
    }

    #[test]
    fn test_from_slack_error() {
        let err: AppError = SlackError::Auth(AuthError::MissingHeaders).into();
        assert!(matches!(err, AppError::Authentication(AuthError::MissingHeaders)));

        let err: AppError = SlackError::Parse("nope".into()).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = SlackError::Network("down".into()).into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_response_body_is_empty() {
        let response = AppError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
