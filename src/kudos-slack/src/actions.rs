//! Interactive component payloads.
//!
//! Button clicks, menu selections and message shortcuts arrive as a
//! form-encoded body with a single `payload` field holding JSON.

use serde::{Deserialize, Serialize};

/// Callback ID of the "flag this message" shortcut.
pub const FLAG_CALLBACK_ID: &str = "flag";

/// Payload types accepted as interactive actions.
pub const ACTION_TYPES: &[&str] = &["interactive_message", "message_action", "block_actions"];

/// Team reference inside an action payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionTeam {
    /// Team ID.
    pub id: String,
    /// Team domain.
    #[serde(default)]
    pub domain: String,
}

/// User or channel reference inside an action payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRef {
    /// ID.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// The message an action was invoked on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionMessage {
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Message author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Message timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

/// A single block element action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockAction {
    /// Action ID set on the element.
    pub action_id: String,
    /// Selected value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Interactive component payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPayload {
    /// Payload type (`interactive_message`, `message_action`, `block_actions`).
    #[serde(rename = "type")]
    pub payload_type: String,
    /// Callback ID of the component or shortcut.
    #[serde(default)]
    pub callback_id: Option<String>,
    /// Team the action happened in.
    pub team: ActionTeam,
    /// User who triggered the action.
    pub user: ActionRef,
    /// Channel the action happened in.
    #[serde(default)]
    pub channel: Option<ActionRef>,
    /// Message the legacy attachment belonged to.
    #[serde(default)]
    pub original_message: Option<ActionMessage>,
    /// Message a shortcut or block action was invoked on.
    #[serde(default)]
    pub message: Option<ActionMessage>,
    /// Block element actions.
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

impl ActionPayload {
    /// Effective callback ID.
    ///
    /// Block actions carry no callback ID; the first element's action ID is
    /// used instead.
    pub fn callback_id(&self) -> Option<&str> {
        self.callback_id
            .as_deref()
            .or_else(|| self.actions.first().map(|a| a.action_id.as_str()))
    }

    /// Text of the message the action targets.
    pub fn target_text(&self) -> Option<&str> {
        self.original_message
            .as_ref()
            .or(self.message.as_ref())
            .map(|m| m.text.as_str())
    }

    /// Channel ID, if the action happened in a channel.
    pub fn channel_id(&self) -> Option<&str> {
        self.channel.as_ref().map(|c| c.id.as_str())
    }
}

/// Form body wrapping an interactive payload.
#[derive(Debug, Deserialize)]
pub(crate) struct ActionForm {
    pub payload: String,
}
