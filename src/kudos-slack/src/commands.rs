//! Slack slash command handling.
//!
//! Slash commands arrive as form-encoded POST bodies. Supported commands:
//! - `/ping` - Liveness check, answered with an ephemeral "Pong!"

use serde::{Deserialize, Serialize};

/// Form fields of a slash command invocation.
///
/// Only the fields Kudos acts on are kept; the rest of the form is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// Workspace the command came from.
    pub team_id: String,
    /// Channel the command was typed in.
    pub channel_id: String,
    /// Invoking user.
    pub user_id: String,
    /// Command name including the slash, e.g. `/ping`.
    pub command: String,
    /// Arguments typed after the command.
    #[serde(default)]
    pub text: String,
}

/// Commands Kudos knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Ping,
    /// Anything else; logged and otherwise ignored.
    Unknown { command: String, text: String },
}

/// Match a payload against the known commands. Case-insensitive.
pub fn parse_command(payload: &SlashCommandPayload) -> ParsedCommand {
    match payload.command.to_lowercase().as_str() {
        "/ping" => ParsedCommand::Ping,
        _ => ParsedCommand::Unknown {
            command: payload.command.clone(),
            text: payload.text.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(command: &str, text: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            team_id: "T1".into(),
            channel_id: "C1".into(),
            user_id: "U1".into(),
            command: command.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_parse_ping_command() {
        assert_eq!(parse_command(&invocation("/ping", "")), ParsedCommand::Ping);
        assert_eq!(parse_command(&invocation("/PING", "x")), ParsedCommand::Ping);
    }

    #[test]
    fn test_other_commands_are_unknown() {
        match parse_command(&invocation("/kudos", "  top 10 ")) {
            ParsedCommand::Unknown { command, text } => {
                assert_eq!(command, "/kudos");
                assert_eq!(text, "top 10");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_payload_from_form() {
        let body = "team_id=T1&channel_id=C1&user_id=U1&command=%2Fping&text=";
        let payload: SlashCommandPayload = serde_urlencoded::from_str(body).unwrap();

        assert_eq!(payload.team_id, "T1");
        assert_eq!(payload.command, "/ping");
        assert_eq!(parse_command(&payload), ParsedCommand::Ping);
    }

    #[test]
    fn test_payload_ignores_unused_form_fields() {
        let body = "token=legacy&team_id=T1&team_domain=acme&channel_id=C1&user_id=U1\
                    &user_name=alice&command=%2Fping&text=hi\
                    &response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2F1\
                    &trigger_id=13345224609.738474920";
        let payload: SlashCommandPayload = serde_urlencoded::from_str(body).unwrap();

        assert_eq!(payload.user_id, "U1");
        assert_eq!(payload.text, "hi");
        let echoed = serde_json::to_value(&payload).unwrap();
        assert!(echoed.get("response_url").is_none());
        assert!(echoed.get("trigger_id").is_none());
        assert!(echoed.get("user_name").is_none());
    }
}
