//! Deferred event handlers.
//!
//! One handler per classified variant. Handlers run on the worker pool,
//! after the webhook has been acknowledged, so failures are logged and never
//! surface to the caller.

use std::sync::Arc;

use kudos_ledger::{LedgerError, ScoreLedger};
use kudos_slack::actions::{ActionPayload, FLAG_CALLBACK_ID};
use kudos_slack::commands::{ParsedCommand, SlashCommandPayload, parse_command};
use kudos_slack::events::{ClassifiedEvent, MessageCallback};
use kudos_slack::messages::{
    self, EphemeralMessage, FLAG_CONFIRMATION, OutboundMessage, PONG,
};
use kudos_slack::{Credential, MentionTag, MessageSender, SlackError, scan};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

/// Failures inside a deferred handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Score update failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Blocking ledger task panicked or was cancelled.
    #[error("ledger task failed: {0}")]
    Join(#[from] JoinError),

    /// Reply could not be sent.
    #[error("reply failed: {0}")]
    Reply(#[from] SlackError),
}

/// A classified event ready for deferred handling.
#[derive(Debug, Clone)]
pub struct Job {
    /// The event to handle.
    pub event: ClassifiedEvent,
    /// Credentials of the event's workspace.
    pub credential: Credential,
}

/// Executes deferred work for classified events.
pub struct EventHandlers {
    sender: Arc<dyn MessageSender>,
    ledger: Arc<dyn ScoreLedger>,
    admin_channel: Option<String>,
}

impl EventHandlers {
    /// Create handlers over the given collaborators.
    pub fn new(
        sender: Arc<dyn MessageSender>,
        ledger: Arc<dyn ScoreLedger>,
        admin_channel: Option<String>,
    ) -> Self {
        Self {
            sender,
            ledger,
            admin_channel,
        }
    }

    /// Handle one job. Never fails; problems are logged.
    pub async fn handle(&self, job: Job) {
        let Job { event, credential } = job;
        match event {
            ClassifiedEvent::MessageCallback(msg) => self.handle_message(msg, &credential).await,
            ClassifiedEvent::SlashCommand(cmd) => self.handle_command(cmd, &credential).await,
            ClassifiedEvent::InteractiveAction(action) => {
                self.handle_action(action, &credential).await
            }
            ClassifiedEvent::UrlChallenge(_) => {
                warn!("URL challenge reached the worker pool, ignoring");
            }
            ClassifiedEvent::Unhandled(u) => {
                debug!(kind = %u.kind, "Unhandled event");
            }
        }
    }

    async fn handle_message(&self, msg: MessageCallback, credential: &Credential) {
        let event = &msg.event;
        if !event.is_scorable() {
            debug!(subtype = ?event.subtype, bot_id = ?event.bot_id, "Message not scorable, skipping");
            return;
        }
        let Some(author) = event.user.as_deref() else {
            return;
        };

        let tags = scan(&event.text);
        if tags.is_empty() {
            return;
        }
        debug!(
            workspace = %msg.team_id,
            event_id = ?msg.event_id,
            tags = tags.len(),
            "Processing kudos"
        );

        for tag in tags {
            let text = if tag.user_id == author {
                info!(workspace = %msg.team_id, user = %author, "Refused self kudos");
                messages::self_kudos_reply(author)
            } else {
                match self.apply(&msg.team_id, &tag).await {
                    Ok(score) => {
                        info!(
                            workspace = %msg.team_id,
                            user = %tag.user_id,
                            direction = ?tag.direction,
                            score,
                            "Score changed"
                        );
                        messages::score_reply(&tag.user_id, tag.direction, score)
                    }
                    Err(e) => {
                        error!(
                            workspace = %msg.team_id,
                            user = %tag.user_id,
                            error = %e,
                            "Failed to update score"
                        );
                        messages::ledger_failure_reply(&tag.user_id, tag.direction)
                    }
                }
            };

            let reply =
                OutboundMessage::new(&event.channel, text).in_thread(event.reply_thread_ts());
            if let Err(e) = self.sender.post_message(credential.bot_token(), &reply).await {
                warn!(channel = %event.channel, error = %e, "Failed to post reply");
            }
        }
    }

    /// Apply one tag on a blocking thread.
    async fn apply(&self, workspace: &str, tag: &MentionTag) -> Result<i64, HandlerError> {
        let ledger = Arc::clone(&self.ledger);
        let workspace = workspace.to_string();
        let user = tag.user_id.clone();
        let direction = tag.direction;

        let score =
            tokio::task::spawn_blocking(move || ledger.apply(&workspace, &user, direction))
                .await??;
        Ok(score)
    }

    async fn handle_command(&self, cmd: SlashCommandPayload, credential: &Credential) {
        match parse_command(&cmd) {
            ParsedCommand::Ping => {
                let reply = EphemeralMessage::new(&cmd.channel_id, &cmd.user_id, PONG);
                if let Err(e) = self.sender.post_ephemeral(credential.bot_token(), &reply).await {
                    warn!(error = %e, "Failed to respond to ping");
                }
            }
            ParsedCommand::Unknown { command, text } => {
                info!(command = %command, text = %text, user = %cmd.user_id, "Unknown command");
            }
        }
    }

    async fn handle_action(&self, action: ActionPayload, credential: &Credential) {
        match action.callback_id() {
            Some(FLAG_CALLBACK_ID) => {
                if let Err(e) = self.flag_message(&action, credential).await {
                    warn!(error = %e, "Failed to process flagged message");
                }
            }
            other => {
                info!(
                    callback_id = ?other,
                    payload_type = %action.payload_type,
                    user = %action.user.id,
                    "Unhandled action"
                );
            }
        }
    }

    async fn flag_message(
        &self,
        action: &ActionPayload,
        credential: &Credential,
    ) -> Result<(), HandlerError> {
        let text = action.target_text().unwrap_or_default();
        info!(
            workspace = %action.team.id,
            reporter = %action.user.id,
            "Message flagged"
        );

        if let Some(channel) = action.channel_id() {
            let confirmation = EphemeralMessage::new(channel, &action.user.id, FLAG_CONFIRMATION);
            self.sender
                .post_ephemeral(credential.bot_token(), &confirmation)
                .await?;
        }

        match &self.admin_channel {
            Some(admin) => {
                let notification = OutboundMessage::new(
                    admin,
                    messages::flag_notification(&action.user.id, text),
                );
                let ts = self
                    .sender
                    .post_message(credential.bot_token(), &notification)
                    .await?;
                debug!(ts = %ts, "Admins notified");
            }
            None => warn!("No admin channel configured, flag not forwarded"),
        }
        Ok(())
    }
}
