//! Slack platform layer for Kudos.
//!
//! This crate turns signed Slack webhooks into typed events and sends replies:
//! - Request signature verification (HMAC-SHA256, `v0` scheme)
//! - Event classification (challenge, slash command, interactive action, message)
//! - Kudos mention scanning (`<@U123>++` / `<@U123>--`)
//! - Reply composition and the outbound Web API client
//! - Per-workspace credentials and the OAuth install flow
//!
//! # Example
//!
//! ```rust,ignore
//! use kudos_slack::{EventClassifier, InboundRequest, SlackConfig};
//!
//! let config = SlackConfig::from_env()?;
//! let classifier = EventClassifier::from_config(&config);
//! let event = classifier.classify(&InboundRequest::new(method, headers, body))?;
//! ```
//!
//! # Configuration
//!
//! Required environment variables:
//! - `SLACK_SIGNING_SECRET` - Signing secret for request verification
//!
//! Optional:
//! - `SLACK_TEAM_ID`, `SLACK_BOT_TOKEN`, `SLACK_USER_TOKEN` - Static workspace
//! - `SLACK_CLIENT_ID`, `SLACK_CLIENT_SECRET`, `SLACK_REDIRECT_URI` - For OAuth flow
//! - `SLACK_ADMIN_CHANNEL` - Receives flagged-message notifications
//! - `SLACK_API_BASE_URL` - Web API base URL override

pub mod actions;
pub mod classifier;
pub mod client;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod mentions;
pub mod messages;
pub mod oauth;
pub mod signature;

// Re-export main types
pub use classifier::{EventClassifier, InboundRequest};
pub use client::{MessageSender, SlackClient};
pub use config::SlackConfig;
pub use credentials::{Credential, CredentialError, CredentialResolver, CredentialStore};
pub use error::{AuthError, SlackError, SlackResult};
pub use events::ClassifiedEvent;
pub use mentions::{Direction, MentionTag, scan};
