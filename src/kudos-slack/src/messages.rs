//! Outbound message types and reply text.

use serde::{Deserialize, Serialize};

use crate::mentions::Direction;

/// Reply to `/ping`.
pub const PONG: &str = "Pong!";

/// Ephemeral confirmation sent to a user who flagged a message.
pub const FLAG_CONFIRMATION: &str = "Message successfully flagged!";

/// A message to post with `chat.postMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Destination channel.
    pub channel: String,
    /// Message text (mrkdwn).
    pub text: String,
    /// Thread timestamp (for replies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl OutboundMessage {
    /// Create a top-level message.
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set thread timestamp (for replies).
    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }
}

/// An ephemeral message for `chat.postEphemeral`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralMessage {
    /// Channel the user is in.
    pub channel: String,
    /// The only user who will see the message.
    pub user: String,
    /// Message text.
    pub text: String,
}

impl EphemeralMessage {
    /// Create an ephemeral message.
    pub fn new(
        channel: impl Into<String>,
        user: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user: user.into(),
            text: text.into(),
        }
    }
}

/// Announce a score change.
pub fn score_reply(user: &str, direction: Direction, score: i64) -> String {
    match direction {
        Direction::Increment => {
            format!("Congrats <@{}>! Score now at {} :smile:", user, score)
        }
        Direction::Decrement => {
            format!("Commiserations <@{}>. Score now at {} :cry:", user, score)
        }
    }
}

/// Refuse a self-directed tag.
pub fn self_kudos_reply(user: &str) -> String {
    format!(
        "No <@{}>, try patting yourself on the back instead :stuck_out_tongue_closed_eyes:",
        user
    )
}

/// Apologize for a score that could not be recorded.
pub fn ledger_failure_reply(user: &str, direction: Direction) -> String {
    match direction {
        Direction::Increment => format!(
            "Congrats <@{}>! I was unable to update your score, so you'll have to accept this smile instead :smile:",
            user
        ),
        Direction::Decrement => format!(
            "Sorry <@{}>, I was unable to update your score this time.",
            user
        ),
    }
}

/// Admin notification quoting a flagged message.
pub fn flag_notification(reporter: &str, text: &str) -> String {
    let quoted = text
        .lines()
        .map(|line| format!(">{}", line))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Message flagged by <@{}>:\n{}\n", reporter, quoted)
}
