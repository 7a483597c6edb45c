//! Slack webhook endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use kudos_slack::{ClassifiedEvent, InboundRequest};
use tracing::debug;

use crate::dispatch::EnqueueOutcome;
use crate::error::{AppError, AppResult};
use crate::handlers::Job;
use crate::state::AppState;

/// Authenticate, classify and acknowledge a Slack request.
///
/// Challenges are answered inline. Everything else that needs work is
/// queued for the worker pool and acknowledged with 202, even when the queue
/// is full.
pub async fn slack_webhook(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let request = InboundRequest::new(method, headers, body);
    let event = state.classifier.classify(&request)?;

    match event {
        ClassifiedEvent::UrlChallenge(challenge) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            challenge.challenge,
        )
            .into_response()),
        ClassifiedEvent::Unhandled(unhandled) => {
            debug!(kind = %unhandled.kind, "Acknowledging unhandled request");
            Ok(StatusCode::ACCEPTED.into_response())
        }
        ClassifiedEvent::MessageCallback(ref msg) if !msg.event.is_scorable() => {
            debug!(
                subtype = ?msg.event.subtype,
                bot_id = ?msg.event.bot_id,
                "Acknowledging message that cannot change scores"
            );
            Ok(StatusCode::ACCEPTED.into_response())
        }
        event => {
            let workspace = event
                .workspace_id()
                .ok_or_else(|| AppError::BadRequest("event without workspace".to_string()))?;
            let credential = state.credentials.resolve(workspace).await?;

            if state.dispatcher.enqueue(Job { event, credential }) != EnqueueOutcome::Queued {
                debug!("Event dropped, acknowledging anyway");
            }
            Ok(StatusCode::ACCEPTED.into_response())
        }
    }
}
