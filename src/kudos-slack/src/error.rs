//! Error types for the Slack platform layer.
//!
//! Request-level failures are split into [`AuthError`] (the request could not
//! be authenticated) and [`SlackError::Parse`] (the request was authentic but
//! its payload could not be decoded). Both are terminal for the request and
//! are never retried. Everything else in [`SlackError`] describes failures of
//! outbound calls or configuration.

use thiserror::Error;

/// Reasons an inbound request fails authentication.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// The request was not a POST submission.
    #[error("invalid method, expected POST")]
    BadMethod,

    /// Timestamp or signature header missing or implausible.
    #[error("missing or malformed signature headers")]
    MissingHeaders,

    /// The signature did not match the request body.
    #[error("request signature does not match")]
    InvalidSignature,
}

/// Errors that can occur during Slack operations.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inbound request failed authentication.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Inbound payload could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// API request failed.
    #[error("Slack API error: {0}")]
    Api(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Channel not found or bot not in channel.
    #[error("Channel error: {0}")]
    Channel(String),

    /// Outbound token rejected by the platform.
    #[error("Token rejected: {0}")]
    TokenRejected(String),
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlackError::Timeout(err.to_string())
        } else if err.is_connect() {
            SlackError::Network(format!("Connection failed: {}", err))
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::Parse(format!("invalid JSON: {}", err))
    }
}

impl From<serde_urlencoded::de::Error> for SlackError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        SlackError::Parse(format!("invalid form body: {}", err))
    }
}

/// Result type for Slack operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;

/// The `error` code of an `ok: false` Web API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackApiError {
    /// e.g. `channel_not_found`.
    pub code: String,
}

impl SlackApiError {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl From<SlackApiError> for SlackError {
    fn from(err: SlackApiError) -> Self {
        match err.code.as_str() {
            // Default retry after 30 seconds if not specified
            "rate_limited" => SlackError::RateLimited {
                retry_after_secs: 30,
            },
            "invalid_auth" | "account_inactive" | "token_revoked" | "not_authed" => {
                SlackError::TokenRejected(err.code)
            }
            "channel_not_found" | "not_in_channel" => SlackError::Channel(err.code),
            _ => SlackError::Api(err.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SlackError::Config("SLACK_SIGNING_SECRET not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: SLACK_SIGNING_SECRET not set"
        );

        let err = SlackError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "Rate limited: retry after 60 seconds");
    }

    #[test]
    fn test_auth_error_wraps() {
        let err = SlackError::from(AuthError::InvalidSignature);
        assert!(matches!(err, SlackError::Auth(AuthError::InvalidSignature)));
        assert_eq!(
            err.to_string(),
            "Authentication error: request signature does not match"
        );
    }

    #[test]
    fn test_form_error_is_parse() {
        let err: SlackError = serde_urlencoded::from_str::<Vec<(String, u32)>>("a=x")
            .unwrap_err()
            .into();
        assert!(matches!(err, SlackError::Parse(_)));
    }

    #[test]
    fn test_api_error_conversion() {
        let err: SlackError = SlackApiError::new("invalid_auth").into();
        assert!(matches!(err, SlackError::TokenRejected(_)));

        let err: SlackError = SlackApiError::new("not_in_channel").into();
        assert!(matches!(err, SlackError::Channel(_)));

        let err: SlackError = SlackApiError::new("rate_limited").into();
        assert!(matches!(err, SlackError::RateLimited { .. }));

        let err: SlackError = SlackApiError::new("msg_too_long").into();
        assert!(matches!(err, SlackError::Api(code) if code == "msg_too_long"));
    }
}
