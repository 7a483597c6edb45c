//! HTTP routes and handlers.

mod health;
mod webhook;

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get},
};

use crate::state::AppState;

pub use health::HealthResponse;

/// Slack webhook paths. All share one handler.
pub const WEBHOOK_PATHS: &[&str] = &["/slack/events", "/slack/commands", "/slack/actions"];

/// Create the API routes.
///
/// Webhooks accept any method so that non-POST requests are answered with
/// 400 rather than 405.
pub fn routes() -> Router<Arc<AppState>> {
    let router = Router::new().route("/health", get(health::health_check));

    WEBHOOK_PATHS.iter().fold(router, |router, path| {
        router.route(path, any(webhook::slack_webhook))
    })
}
