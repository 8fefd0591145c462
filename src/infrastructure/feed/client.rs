//! Feed WebSocket Client
//!
//! Owns the single streaming connection to the ticker feed: connect,
//! message processing, teardown, and reconnection with bounded
//! exponential backoff. Lifecycle events are emitted over an mpsc
//! channel toward the pipeline; this client never touches series state.
//!
//! # Lifecycle
//!
//! Idle -> Connecting -> Open -> (unclean close -> backoff retry) ->
//! terminal failure once the attempt budget is spent. A caller-initiated
//! close (cancellation token) is clean and never retries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::codec::SnapshotCodec;
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use super::state::{ConnectionState, FeedState};
use crate::domain::streaming::FeedEvent;
use crate::infrastructure::metrics;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the feed client.
#[derive(Debug, thiserror::Error)]
pub enum FeedClientError {
    /// WebSocket protocol or transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Server closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Maximum reconnection attempts exceeded.
    #[error("maximum reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// WebSocket URL of the feed.
    pub url: String,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
}

impl FeedClientConfig {
    /// Create a new configuration with default reconnection behavior.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

// =============================================================================
// Feed Client
// =============================================================================

/// WebSocket client for the ticker feed.
///
/// Exactly one instance drives one socket; the handle never escapes the
/// connection loop. Dropping the cancellation token's guardianship
/// (i.e. calling `cancel()`) tears the connection down cleanly, and any
/// pending reconnect timer is abandoned at the same select point.
pub struct FeedClient {
    config: FeedClientConfig,
    codec: SnapshotCodec,
    event_tx: mpsc::Sender<FeedEvent>,
    state: Arc<FeedState>,
    cancel: CancellationToken,
    running: AtomicBool,
}

impl FeedClient {
    /// Create a new feed client.
    #[must_use]
    pub fn new(
        config: FeedClientConfig,
        event_tx: mpsc::Sender<FeedEvent>,
        state: Arc<FeedState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            codec: SnapshotCodec::new(),
            event_tx,
            state,
            cancel,
            running: AtomicBool::new(false),
        }
    }

    /// Run the connection loop until cancelled or the retry budget is
    /// exhausted.
    ///
    /// Calling `run` while a loop is already in flight is a no-op, not
    /// an error: the attempt-in-progress guard keeps a second loop from
    /// ever opening a second socket.
    ///
    /// # Errors
    ///
    /// Returns [`FeedClientError::MaxReconnectAttemptsExceeded`] after
    /// the configured number of consecutive unclean closes.
    pub async fn run(self: Arc<Self>) -> Result<(), FeedClientError> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("feed client already running, ignoring re-entrant run");
            return Ok(());
        }

        let result = self.run_loop().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_loop(&self) -> Result<(), FeedClientError> {
        let mut reconnect_policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                self.state.set_state(ConnectionState::Closed);
                tracing::info!("feed client cancelled");
                return Ok(());
            }

            match self.connect_and_run(&mut reconnect_policy).await {
                Ok(()) => {
                    self.state.set_state(ConnectionState::Closed);
                    tracing::info!("feed connection closed cleanly");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "feed connection error");
                    self.state.set_state(ConnectionState::Closed);
                    self.state.set_last_error(e.to_string());

                    if let Some(delay) = reconnect_policy.next_delay() {
                        let attempt = reconnect_policy.attempt_count();
                        let attempts_left = reconnect_policy.attempts_remaining();
                        self.state.increment_reconnect_attempts();
                        metrics::record_reconnect();

                        tracing::info!(
                            attempt,
                            delay_ms = delay.as_millis(),
                            "reconnecting to feed"
                        );

                        let _ = self
                            .event_tx
                            .send(FeedEvent::Disconnected {
                                reason: e.to_string(),
                                attempts_left,
                                next_retry: delay,
                            })
                            .await;

                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                self.state.set_state(ConnectionState::Closed);
                                tracing::info!("feed client cancelled during reconnect delay");
                                return Ok(());
                            }
                            () = tokio::time::sleep(delay) => {}
                        }

                        let _ = self.event_tx.send(FeedEvent::Reconnecting { attempt }).await;
                    } else {
                        self.state.set_failed();
                        let _ = self.event_tx.send(FeedEvent::Failed).await;
                        return Err(FeedClientError::MaxReconnectAttemptsExceeded);
                    }
                }
            }
        }
    }

    /// Connect and process messages until an error or cancellation.
    ///
    /// `Ok(())` means a clean, caller-initiated close; every other exit
    /// is an unclean close that feeds the retry policy. Connect-time
    /// failures (bad address, refused TCP) travel the same error path
    /// as runtime ones and consume the same budget.
    async fn connect_and_run(
        &self,
        reconnect_policy: &mut ReconnectPolicy,
    ) -> Result<(), FeedClientError> {
        self.state.set_state(ConnectionState::Connecting);
        let _ = self.event_tx.send(FeedEvent::Connecting).await;
        tracing::info!(url = %self.config.url, "connecting to feed");

        let connect = tokio_tungstenite::connect_async(self.config.url.as_str());
        let (ws_stream, _response) = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            result = connect => result?,
        };

        self.state.set_state(ConnectionState::Open);
        self.state.reset_reconnect_attempts();
        reconnect_policy.reset();
        let _ = self.event_tx.send(FeedEvent::Connected).await;
        tracing::info!("feed connected");

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.state.set_state(ConnectionState::Closing);
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.state.increment_messages();
                            self.handle_text_message(text.as_str()).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("server sent close frame");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Binary and pong frames are not part of the feed.
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("feed stream ended");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Decode one text payload and forward the batch.
    ///
    /// Decode failures are reported and dropped; they never affect the
    /// connection.
    async fn handle_text_message(&self, text: &str) {
        match self.codec.decode(text, Utc::now()) {
            Ok(batch) => {
                if batch.is_empty() {
                    return;
                }
                metrics::record_batch_received(batch.len() as u64);
                let _ = self.event_tx.send(FeedEvent::Batch(batch)).await;
            }
            Err(e) => {
                metrics::record_decode_failure();
                tracing::warn!(error = %e, "dropping undecodable feed message");
                let _ = self.event_tx.send(FeedEvent::DecodeFailed(e.to_string())).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_carries_url_and_default_policy() {
        let config = FeedClientConfig::new("ws://localhost:4000/ws");
        assert_eq!(config.url, "ws://localhost:4000/ws");
        assert_eq!(config.reconnect.max_attempts, 10);
    }

    #[tokio::test]
    async fn run_is_a_noop_when_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, mut rx) = mpsc::channel(8);
        let client = Arc::new(FeedClient::new(
            FeedClientConfig::new("ws://localhost:4000/ws"),
            tx,
            Arc::new(FeedState::new()),
            cancel,
        ));

        assert!(client.run().await.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn re_entrant_run_is_a_noop() {
        let cancel = CancellationToken::new();
        let (tx, _rx) = mpsc::channel(8);
        let state = Arc::new(FeedState::new());
        let client = Arc::new(FeedClient::new(
            FeedClientConfig::new("ws://localhost:4000/ws"),
            tx,
            state,
            cancel.clone(),
        ));

        // Simulate a loop already in flight.
        client.running.store(true, Ordering::SeqCst);
        assert!(Arc::clone(&client).run().await.is_ok());

        client.running.store(false, Ordering::SeqCst);
        cancel.cancel();
        assert!(client.run().await.is_ok());
    }
}
