//! Application state management.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kudos_ledger::{MemoryLedger, RedbLedger, ScoreLedger};
use kudos_slack::oauth::OAuthState;
use kudos_slack::{
    CredentialResolver, CredentialStore, EventClassifier, MessageSender, SlackClient, SlackConfig,
};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::handlers::EventHandlers;

/// Application state shared across request handlers.
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// Authenticates and classifies inbound requests.
    pub classifier: EventClassifier,
    /// Resolves per-workspace credentials.
    pub credentials: Arc<dyn CredentialResolver>,
    /// Score storage.
    pub ledger: Arc<dyn ScoreLedger>,
    /// Deferred work queue.
    pub dispatcher: Dispatcher,
    /// OAuth install flow, when configured.
    pub oauth: Option<OAuthState>,
    /// Start time.
    start_time: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("oauth", &self.oauth.is_some())
            .field("start_time", &self.start_time)
            .finish()
    }
}

impl AppState {
    /// Build the production state: redb or in-memory ledger, Slack Web API
    /// client, and a credential store seeded from configuration.
    ///
    /// Spawns the worker pool, so it must run inside a tokio runtime.
    pub fn new(config: ServerConfig, slack: SlackConfig) -> anyhow::Result<Self> {
        let ledger: Arc<dyn ScoreLedger> = match &config.score_db {
            Some(path) => Arc::new(RedbLedger::open(path)?),
            None => {
                warn!("KUDOS_SCORE_DB not set, scores are kept in memory only");
                Arc::new(MemoryLedger::new())
            }
        };

        let client = SlackClient::from_config(&slack)?;
        let store = Arc::new(CredentialStore::from_config(&slack));
        if store.is_empty() && !slack.has_oauth() {
            warn!("No workspace credentials and no OAuth configured, replies will fail");
        } else {
            info!(workspaces = store.len(), "Loaded workspace credentials");
        }

        let oauth = if slack.has_oauth() {
            info!("OAuth install flow enabled");
            Some(OAuthState::from_config(
                &slack,
                client.clone(),
                Arc::clone(&store),
            )?)
        } else {
            None
        };

        let mut state = Self::with_components(
            config,
            &slack,
            store,
            Arc::new(client),
            ledger,
        );
        state.oauth = oauth;
        Ok(state)
    }

    /// Build state from explicit collaborators.
    ///
    /// Spawns the worker pool, so it must run inside a tokio runtime.
    pub fn with_components(
        config: ServerConfig,
        slack: &SlackConfig,
        credentials: Arc<dyn CredentialResolver>,
        sender: Arc<dyn MessageSender>,
        ledger: Arc<dyn ScoreLedger>,
    ) -> Self {
        let handlers = Arc::new(EventHandlers::new(
            sender,
            Arc::clone(&ledger),
            slack.admin_channel().map(String::from),
        ));
        let dispatcher = Dispatcher::start(&config.dispatch, handlers);

        Self {
            config,
            classifier: EventClassifier::from_config(slack),
            credentials,
            ledger,
            dispatcher,
            oauth: None,
            start_time: Instant::now(),
        }
    }

    /// Time since the state was created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Drain queued work and release the ledger.
    pub async fn shutdown(&self) {
        self.dispatcher
            .shutdown(self.config.shutdown_timeout_duration())
            .await;

        let ledger = Arc::clone(&self.ledger);
        match tokio::task::spawn_blocking(move || ledger.close()).await {
            Ok(Ok(())) => info!("Score ledger closed"),
            Ok(Err(e)) => warn!(error = %e, "Failed to close score ledger"),
            Err(e) => warn!(error = %e, "Ledger close task failed"),
        }
    }
}
