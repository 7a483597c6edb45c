//! Kudos server binary.

use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kudos_server::{ServerConfig, run_with_shutdown};
use kudos_slack::SlackConfig;

/// Kudos Slack webhook server
#[derive(Parser)]
#[command(name = "kudos-server")]
#[command(about = "Slack webhook server that keeps kudos scores")]
#[command(version)]
struct Args {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address (overrides config and KUDOS_LISTEN_ADDR)
    #[arg(short, long)]
    listen: Option<String>,

    /// Path of the redb score file (overrides config and KUDOS_SCORE_DB)
    #[arg(long)]
    score_db: Option<String>,

    /// Number of worker tasks
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

fn load_config(args: &Args) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::from_env()?,
    };

    if let Some(listen) = &args.listen {
        config.listen_addr = listen.clone();
    }
    if let Some(path) = &args.score_db {
        config.score_db = Some(path.into());
    }
    if let Some(workers) = args.workers {
        config.dispatch.workers = workers;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    if let Err(e) = &dotenv {
        if !e.not_found() {
            warn!("Failed to load .env file: {}", e);
        }
    }

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid server configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let slack = match SlackConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid Slack configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting Kudos server on {}", config.listen_addr);
    info!("Graceful shutdown timeout: {}s", config.shutdown_timeout);
    info!("Press Ctrl+C to stop");

    let shutdown_timeout = config.shutdown_timeout;

    // Create shutdown signal
    let shutdown = async move {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C, initiating graceful shutdown (timeout: {}s)...", shutdown_timeout);
            }
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown (timeout: {}s)...", shutdown_timeout);
            }
        }
    };

    if let Err(e) = run_with_shutdown(config, slack, shutdown).await {
        error!("Server error: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}
