//! Outbound Slack Web API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::SlackConfig;
use crate::error::{SlackApiError, SlackError, SlackResult};
use crate::messages::{EphemeralMessage, OutboundMessage};
use crate::oauth::OAuthTokenResponse;

/// Default timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry delay used when a 429 carries no `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Sends replies on behalf of a workspace.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Post a message, returning its timestamp.
    async fn post_message(&self, token: &str, message: &OutboundMessage) -> SlackResult<String>;

    /// Post a message visible to a single user.
    async fn post_ephemeral(&self, token: &str, message: &EphemeralMessage) -> SlackResult<()>;
}

/// Slack Web API client.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
}

impl SlackClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> SlackResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SlackError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client from configuration.
    pub fn from_config(config: &SlackConfig) -> SlackResult<Self> {
        Self::new(config.api_base_url())
    }

    /// Wrap an existing HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Exchange an OAuth authorization code for tokens.
    pub async fn oauth_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> SlackResult<OAuthTokenResponse> {
        let mut form = vec![
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
        ];
        if let Some(uri) = redirect_uri {
            form.push(("redirect_uri", uri));
        }

        let response = self
            .http
            .post(self.url("oauth.v2.access"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!(
                "Token exchange failed with status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Make an authenticated API call and check the `ok` flag.
    async fn api_call<P, T>(&self, method: &str, token: &str, payload: &P) -> SlackResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(method))
            .bearer_auth(token)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(method, retry_after, "Slack API rate limited");
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{}: {}", status, body)));
        }

        let body: serde_json::Value = response.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let code = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown");
            return Err(SlackApiError::new(code).into());
        }

        Ok(serde_json::from_value(body)?)
    }
}

#[derive(serde::Deserialize)]
struct PostMessageResponse {
    ts: String,
}

#[async_trait]
impl MessageSender for SlackClient {
    async fn post_message(&self, token: &str, message: &OutboundMessage) -> SlackResult<String> {
        let response: PostMessageResponse =
            self.api_call("chat.postMessage", token, message).await?;
        debug!(channel = %message.channel, ts = %response.ts, "Message posted");
        Ok(response.ts)
    }

    async fn post_ephemeral(&self, token: &str, message: &EphemeralMessage) -> SlackResult<()> {
        let _: serde_json::Value = self.api_call("chat.postEphemeral", token, message).await?;
        debug!(channel = %message.channel, user = %message.user, "Ephemeral message posted");
        Ok(())
    }
}
