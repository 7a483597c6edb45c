//! Per-workspace credentials.
//!
//! Handlers never hold tokens directly; they ask a [`CredentialResolver`] for
//! the workspace an event belongs to. [`CredentialStore`] is the in-process
//! implementation, seeded from configuration and updated by the OAuth
//! install flow.

use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SlackConfig;
use crate::oauth::OAuthTokenResponse;

/// Tokens for one workspace.
#[derive(Clone)]
pub struct Credential {
    /// Workspace (team) ID.
    pub workspace_id: String,
    /// Bot token used for outbound calls.
    pub bot_token: SecretString,
    /// User token, when user scopes were granted.
    pub user_token: Option<SecretString>,
    /// The bot's own user ID, if known.
    pub bot_user_id: Option<String>,
    /// Workspace display name, if known.
    pub team_name: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("workspace_id", &self.workspace_id)
            .field("bot_token", &"[REDACTED]")
            .field("user_token", &self.user_token.as_ref().map(|_| "[REDACTED]"))
            .field("bot_user_id", &self.bot_user_id)
            .field("team_name", &self.team_name)
            .finish()
    }
}

impl Credential {
    /// Create a credential holding only a bot token.
    pub fn new(workspace_id: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            bot_token: SecretString::new(bot_token.into().into()),
            user_token: None,
            bot_user_id: None,
            team_name: None,
        }
    }

    /// Attach a user token.
    pub fn with_user_token(mut self, token: impl Into<String>) -> Self {
        self.user_token = Some(SecretString::new(token.into().into()));
        self
    }

    /// Attach the bot's user ID.
    pub fn with_bot_user_id(mut self, id: impl Into<String>) -> Self {
        self.bot_user_id = Some(id.into());
        self
    }

    /// Get the bot token.
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    /// Get the user token.
    pub fn user_token(&self) -> Option<&str> {
        self.user_token.as_ref().map(|t| t.expose_secret())
    }

    /// Build a credential from a successful OAuth token exchange.
    ///
    /// Returns `None` when the response lacks a team or a bot token.
    pub fn from_oauth(response: &OAuthTokenResponse) -> Option<Self> {
        let team = response.team.as_ref()?;
        let bot_token = response.access_token.as_ref()?;

        Some(Self {
            workspace_id: team.id.clone(),
            bot_token: SecretString::new(bot_token.clone().into()),
            user_token: response
                .authed_user
                .as_ref()
                .and_then(|u| u.access_token.clone())
                .map(|t| SecretString::new(t.into())),
            bot_user_id: response.bot_user_id.clone(),
            team_name: team.name.clone(),
        })
    }
}

/// Errors resolving credentials.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The workspace was never installed.
    #[error("no credentials for workspace {0}")]
    NotFound(String),

    /// The credential source failed transiently.
    #[error("credential source unavailable: {0}")]
    Unavailable(String),
}

/// Lookup of per-workspace credentials.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Resolve the credential for a workspace.
    async fn resolve(&self, workspace_id: &str) -> Result<Credential, CredentialError>;
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct CredentialStore {
    credentials: DashMap<String, Credential>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the statically configured workspace.
    pub fn from_config(config: &SlackConfig) -> Self {
        let store = Self::new();
        if let Some(ws) = config.workspace() {
            let credential = Credential {
                workspace_id: ws.team_id.clone(),
                bot_token: ws.bot_token.clone(),
                user_token: ws.user_token.clone(),
                bot_user_id: None,
                team_name: None,
            };
            store.insert(credential);
        }
        store
    }

    /// Insert or replace the credential for a workspace.
    pub fn insert(&self, credential: Credential) {
        info!(workspace = %credential.workspace_id, "Stored workspace credentials");
        self.credentials
            .insert(credential.workspace_id.clone(), credential);
    }

    /// Number of known workspaces.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether no workspace is known.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl CredentialResolver for CredentialStore {
    async fn resolve(&self, workspace_id: &str) -> Result<Credential, CredentialError> {
        match self.credentials.get(workspace_id) {
            Some(entry) => Ok(entry.value().clone()),
            None => {
                debug!(workspace = %workspace_id, "No credentials for workspace");
                Err(CredentialError::NotFound(workspace_id.to_string()))
            }
        }
    }
}
