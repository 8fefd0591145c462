//! Tickfeed Binary
//!
//! Starts the live ticker aggregation service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tickfeed
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `TICKFEED_WS_URL`: Feed WebSocket URL (default: <ws://localhost:4000/ws>)
//! - `TICKFEED_SYMBOLS`: Comma-separated symbols to watch at startup
//! - `TICKFEED_SERIES_CAP`: Points kept per symbol (default: 50)
//! - `TICKFEED_HEALTH_PORT`: Health check HTTP port (default: 8082)
//! - `TICKFEED_RECONNECT_DELAY_INITIAL_MS`: Initial backoff (default: 1000)
//! - `TICKFEED_RECONNECT_DELAY_MAX_SECS`: Backoff cap (default: 30)
//! - `TICKFEED_MAX_RECONNECT_ATTEMPTS`: Retry budget, 0 = unlimited (default: 10)
//! - `TICKFEED_LOG_JSON`: JSON log output (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use tickfeed::infrastructure::telemetry;
use tickfeed::{
    BroadcastConfig, FeedBroadcastHub, FeedClient, FeedClientConfig, FeedConfig, FeedPipeline,
    FeedState, HealthServer, HealthServerState, ReconnectConfig, WatchSet, init_metrics,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    telemetry::init();

    tracing::info!("Starting tickfeed");

    let _metrics_handle = init_metrics();

    let config = FeedConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Broadcast hub for output distribution
    let broadcast_hub = Arc::new(FeedBroadcastHub::new(BroadcastConfig::from(
        config.broadcast.clone(),
    )));

    // Shared connection state for health reporting
    let feed_state = Arc::new(FeedState::new());

    // Feed event channel: client -> pipeline
    let (event_tx, event_rx) = mpsc::channel(1024);

    // Aggregation pipeline and its control handle
    let (pipeline, handle) = FeedPipeline::new(
        config.series_cap,
        Arc::clone(&broadcast_hub) as Arc<dyn tickfeed::SnapshotSink>,
        Arc::clone(&feed_state),
        event_rx,
        shutdown_token.clone(),
        64,
    );
    tokio::spawn(pipeline.run());

    // Initial watch set
    if !config.symbols.is_empty() {
        let watch: WatchSet = config.symbols.iter().cloned().collect();
        handle.set_watch_set(watch).await?;
    }

    // Feed client
    let client_config = FeedClientConfig {
        url: config.ws_url.clone(),
        reconnect: ReconnectConfig::from_settings(&config.websocket),
    };
    let client = Arc::new(FeedClient::new(
        client_config,
        event_tx,
        Arc::clone(&feed_state),
        shutdown_token.clone(),
    ));
    tokio::spawn(async move {
        if let Err(e) = client.run().await {
            tracing::error!(error = %e, "Feed client error");
        }
    });

    // Health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&feed_state),
        Arc::clone(&broadcast_hub),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    tracing::info!("Tickfeed ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Tickfeed stopped");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &FeedConfig) {
    tracing::info!(
        ws_url = %config.ws_url,
        symbols = config.symbols.len(),
        series_cap = config.series_cap,
        health_port = config.server.health_port,
        max_reconnect_attempts = config.websocket.max_reconnect_attempts,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!("Graceful shutdown started");
}
