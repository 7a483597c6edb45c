//! Configuration for the Slack platform layer.
//!
//! Loaded once at startup and immutable afterwards. Secrets are kept in
//! [`SecretString`] and never printed by `Debug`.

use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::{SlackError, SlackResult};

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Credentials for a workspace configured statically (single-workspace installs).
#[derive(Clone)]
pub struct StaticWorkspace {
    /// Workspace (team) ID.
    pub team_id: String,
    /// Bot OAuth token (xoxb-...).
    pub bot_token: SecretString,
    /// User OAuth token (xoxp-...), if any.
    pub user_token: Option<SecretString>,
}

/// Configuration for Slack integration.
#[derive(Clone)]
pub struct SlackConfig {
    /// Signing secret for request verification.
    signing_secret: SecretString,
    /// Workspace whose tokens are provided directly by configuration.
    workspace: Option<StaticWorkspace>,
    /// OAuth client ID (optional, for the install flow).
    client_id: Option<String>,
    /// OAuth client secret (optional, for the install flow).
    client_secret: Option<SecretString>,
    /// Redirect URI for OAuth (optional).
    redirect_uri: Option<String>,
    /// Channel that receives flagged-message notifications.
    admin_channel: Option<String>,
    /// Web API base URL.
    api_base_url: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("signing_secret", &"[REDACTED]")
            .field(
                "workspace",
                &self.workspace.as_ref().map(|w| w.team_id.as_str()),
            )
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("admin_channel", &self.admin_channel)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl SlackConfig {
    /// Create a new configuration with the signing secret.
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: SecretString::new(signing_secret.into().into()),
            workspace: None,
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            admin_channel: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Register a workspace whose tokens come from configuration.
    pub fn with_workspace(
        mut self,
        team_id: impl Into<String>,
        bot_token: impl Into<String>,
        user_token: Option<String>,
    ) -> Self {
        self.workspace = Some(StaticWorkspace {
            team_id: team_id.into(),
            bot_token: SecretString::new(bot_token.into().into()),
            user_token: user_token.map(|t| SecretString::new(t.into())),
        });
        self
    }

    /// Set OAuth client credentials.
    pub fn with_oauth(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Option<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(SecretString::new(client_secret.into().into()));
        self.redirect_uri = redirect_uri;
        self
    }

    /// Set the channel receiving flagged-message notifications.
    pub fn with_admin_channel(mut self, channel: impl Into<String>) -> Self {
        self.admin_channel = Some(channel.into());
        self
    }

    /// Override the Web API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `SLACK_SIGNING_SECRET`
    ///
    /// Optional variables:
    /// - `SLACK_TEAM_ID` + `SLACK_BOT_TOKEN` (+ `SLACK_USER_TOKEN`)
    /// - `SLACK_CLIENT_ID` + `SLACK_CLIENT_SECRET` (+ `SLACK_REDIRECT_URI`)
    /// - `SLACK_ADMIN_CHANNEL`
    /// - `SLACK_API_BASE_URL`
    pub fn from_env() -> SlackResult<Self> {
        let signing_secret = std::env::var("SLACK_SIGNING_SECRET")
            .map_err(|_| SlackError::Config("SLACK_SIGNING_SECRET not set".to_string()))?;

        let mut config = Self::new(signing_secret);

        match (
            std::env::var("SLACK_TEAM_ID"),
            std::env::var("SLACK_BOT_TOKEN"),
        ) {
            (Ok(team_id), Ok(bot_token)) => {
                if !bot_token.starts_with("xoxb-") {
                    warn!("Bot token doesn't start with 'xoxb-', this may be incorrect");
                }
                let user_token = std::env::var("SLACK_USER_TOKEN").ok();
                config = config.with_workspace(team_id, bot_token, user_token);
            }
            (Err(_), Ok(_)) => {
                warn!("SLACK_BOT_TOKEN set without SLACK_TEAM_ID, ignoring it");
            }
            _ => {}
        }

        if let (Ok(client_id), Ok(client_secret)) = (
            std::env::var("SLACK_CLIENT_ID"),
            std::env::var("SLACK_CLIENT_SECRET"),
        ) {
            let redirect_uri = std::env::var("SLACK_REDIRECT_URI").ok();
            config = config.with_oauth(client_id, client_secret, redirect_uri);
        }

        if let Ok(channel) = std::env::var("SLACK_ADMIN_CHANNEL") {
            config = config.with_admin_channel(channel);
        }

        if let Ok(url) = std::env::var("SLACK_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Get the signing secret.
    pub fn signing_secret(&self) -> &str {
        self.signing_secret.expose_secret()
    }

    /// Get the statically configured workspace, if any.
    pub fn workspace(&self) -> Option<&StaticWorkspace> {
        self.workspace.as_ref()
    }

    /// Get the OAuth client ID.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Get the OAuth client secret.
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_ref().map(|s| s.expose_secret())
    }

    /// Get the OAuth redirect URI.
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// Check if the OAuth install flow is fully configured.
    pub fn has_oauth(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.redirect_uri.is_some()
    }

    /// Get the admin channel for flag notifications.
    pub fn admin_channel(&self) -> Option<&str> {
        self.admin_channel.as_deref()
    }

    /// Get the Web API base URL.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SlackResult<()> {
        if self.signing_secret.expose_secret().is_empty() {
            return Err(SlackError::Config("Signing secret is empty".to_string()));
        }
        if let Some(ws) = &self.workspace {
            if ws.team_id.is_empty() {
                return Err(SlackError::Config("Team ID is empty".to_string()));
            }
            if ws.bot_token.expose_secret().is_empty() {
                return Err(SlackError::Config("Bot token is empty".to_string()));
            }
        }
        Ok(())
    }
}
