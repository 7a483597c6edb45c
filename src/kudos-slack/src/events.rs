//! Classified event types.
//!
//! Every authenticated request resolves to exactly one [`ClassifiedEvent`]
//! variant. Unknown shapes become [`ClassifiedEvent::Unhandled`] and are
//! acknowledged without further processing.

use serde::{Deserialize, Serialize};

use crate::actions::ActionPayload;
use crate::commands::SlashCommandPayload;

/// Outer envelope of an Events API JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Envelope type (`url_verification`, `event_callback`, ...).
    #[serde(rename = "type")]
    pub envelope_type: String,
    /// Handshake token, only on `url_verification`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// Team ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// Event ID, unique per delivery attempt series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// The inner event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<serde_json::Value>,
}

/// Endpoint ownership handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlChallenge {
    /// Token to echo back verbatim.
    pub challenge: String,
}

/// Event payload for channel messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Inner event type, always `message` for scored events.
    #[serde(rename = "type")]
    pub event_type: String,
    /// User who sent the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Text of the message.
    #[serde(default)]
    pub text: String,
    /// Channel where the message was sent.
    #[serde(default)]
    pub channel: String,
    /// Timestamp of the message.
    #[serde(default)]
    pub ts: String,
    /// Thread timestamp (if in a thread).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Subtype of message (e.g., "message_changed").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Bot ID (if message is from a bot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl MessageEvent {
    /// Whether this message may change scores.
    ///
    /// Only plain messages written by a user qualify. Any subtype (edits,
    /// deletions, joins, bot posts) or a bot author suppresses scoring.
    pub fn is_scorable(&self) -> bool {
        self.subtype.is_none() && self.bot_id.is_none() && self.user.is_some()
    }

    /// Thread that replies to this message belong in.
    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

/// A message posted in a workspace.
#[derive(Debug, Clone)]
pub struct MessageCallback {
    /// Workspace the message belongs to.
    pub team_id: String,
    /// Delivery event ID.
    pub event_id: Option<String>,
    /// The message itself.
    pub event: MessageEvent,
}

/// A recognized request the service does not act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unhandled {
    /// What was received, for logging.
    pub kind: String,
}

impl Unhandled {
    /// Create a new unhandled marker.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

/// The result of classifying an authenticated request.
#[derive(Debug, Clone)]
pub enum ClassifiedEvent {
    /// Endpoint handshake, answered synchronously.
    UrlChallenge(UrlChallenge),
    /// Slash command invocation.
    SlashCommand(SlashCommandPayload),
    /// Interactive component callback.
    InteractiveAction(ActionPayload),
    /// Message posted in a channel the app can see.
    MessageCallback(MessageCallback),
    /// Anything else.
    Unhandled(Unhandled),
}

impl ClassifiedEvent {
    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedEvent::UrlChallenge(_) => "url_challenge",
            ClassifiedEvent::SlashCommand(_) => "slash_command",
            ClassifiedEvent::InteractiveAction(_) => "interactive_action",
            ClassifiedEvent::MessageCallback(_) => "message_callback",
            ClassifiedEvent::Unhandled(_) => "unhandled",
        }
    }

    /// Workspace whose credentials handling this event needs, if any.
    pub fn workspace_id(&self) -> Option<&str> {
        match self {
            ClassifiedEvent::SlashCommand(cmd) => Some(&cmd.team_id),
            ClassifiedEvent::InteractiveAction(action) => Some(&action.team.id),
            ClassifiedEvent::MessageCallback(msg) => Some(&msg.team_id),
            ClassifiedEvent::UrlChallenge(_) | ClassifiedEvent::Unhandled(_) => None,
        }
    }
}
