//! Kudos server - Slack webhook endpoint and score keeping.
//!
//! This crate provides:
//! - The signed webhook endpoint for events, slash commands and actions
//! - A bounded job queue drained by a fixed worker pool
//! - Per-variant event handlers (scoring, `/ping`, message flagging)
//! - The OAuth install routes, when configured
//! - Health checks and request logging

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};
use kudos_slack::SlackConfig;
use kudos_slack::oauth::oauth_routes;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Run the server with the given configuration.
pub async fn run(config: ServerConfig, slack: SlackConfig) -> anyhow::Result<()> {
    run_with_shutdown(config, slack, std::future::pending()).await
}

/// Run the server with graceful shutdown support.
pub async fn run_with_shutdown<F>(
    config: ServerConfig,
    slack: SlackConfig,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState::new(config.clone(), slack)?);
    let state_for_cleanup = Arc::clone(&state);
    let app = create_router_with_state(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Starting Kudos server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // Requests are done; finish queued work before releasing the ledger.
    info!("Server shutting down, draining queued events...");
    state_for_cleanup.shutdown().await;

    Ok(())
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    create_router_with_state(Arc::new(state))
}

/// Create the application router with an Arc-wrapped state.
///
/// This variant is useful when you need to keep a reference to the state
/// for cleanup purposes (e.g., during graceful shutdown).
pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let oauth = state.oauth.clone();
    let max_body_size = state.config.max_body_size;

    let mut router = api::routes()
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::timeout_middleware,
        ))
        .with_state(state);

    if let Some(oauth) = oauth {
        router = router.merge(oauth_routes(oauth));
    }

    router
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(axum_middleware::from_fn(middleware::timing_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
