//! Feed Pipeline
//!
//! The single-threaded core of the service. One task owns all mutable
//! state (watch set, series store, last seen prices) and consumes two
//! channels: lifecycle and data events from the feed client, and watch
//! commands from callers. Every decoded batch updates the series store
//! and publishes a snapshot plus a freshly aligned table through the
//! [`SnapshotSink`] port.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::SnapshotSink;
use crate::domain::series::{SeriesStore, align};
use crate::domain::streaming::{Batch, Direction, FeedEvent, FeedStatus, Quote, Snapshot};
use crate::domain::watch::{Symbol, WatchSet};
use crate::infrastructure::feed::FeedState;
use crate::infrastructure::metrics;

// =============================================================================
// Commands and Handle
// =============================================================================

/// Watch-set change requested by a caller.
#[derive(Debug, Clone)]
pub enum WatchCommand {
    /// Replace the whole watch set and reset all series.
    Replace(WatchSet),
    /// Start watching one symbol with an empty series.
    Add(Symbol),
    /// Stop watching one symbol and purge its series.
    Remove(Symbol),
}

/// Errors surfaced by [`FeedHandle`] operations.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// The pipeline has shut down and no longer accepts commands.
    #[error("feed pipeline is no longer running")]
    PipelineClosed,
}

/// Control handle for a running pipeline.
///
/// Cheap to clone; all clones act on the same pipeline.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    command_tx: mpsc::Sender<WatchCommand>,
    cancel: CancellationToken,
}

impl FeedHandle {
    /// Replace the whole watch set.
    ///
    /// All series are reset: every symbol in the new set starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::PipelineClosed`] if the pipeline stopped.
    pub async fn set_watch_set(&self, watch: WatchSet) -> Result<(), HandleError> {
        self.command_tx
            .send(WatchCommand::Replace(watch))
            .await
            .map_err(|_| HandleError::PipelineClosed)
    }

    /// Start watching one symbol. Its series starts empty, even if the
    /// symbol was watched before.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::PipelineClosed`] if the pipeline stopped.
    pub async fn add_watch(&self, symbol: impl Into<Symbol>) -> Result<(), HandleError> {
        self.command_tx
            .send(WatchCommand::Add(symbol.into()))
            .await
            .map_err(|_| HandleError::PipelineClosed)
    }

    /// Stop watching one symbol and discard its series.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::PipelineClosed`] if the pipeline stopped.
    pub async fn remove_watch(&self, symbol: impl Into<Symbol>) -> Result<(), HandleError> {
        self.command_tx
            .send(WatchCommand::Remove(symbol.into()))
            .await
            .map_err(|_| HandleError::PipelineClosed)
    }

    /// Request a clean shutdown of the feed and pipeline.
    ///
    /// Idempotent: repeated calls after the first are no-ops.
    pub fn request_close(&self) {
        self.cancel.cancel();
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Event-driven aggregation pipeline.
pub struct FeedPipeline {
    watch: WatchSet,
    store: SeriesStore,
    last_prices: HashMap<Symbol, f64>,
    sink: Arc<dyn SnapshotSink>,
    feed_state: Arc<FeedState>,
    event_rx: mpsc::Receiver<FeedEvent>,
    command_rx: mpsc::Receiver<WatchCommand>,
    cancel: CancellationToken,
    commands_open: bool,
}

impl FeedPipeline {
    /// Create a pipeline and its control handle.
    ///
    /// `command_capacity` bounds the watch-command queue.
    #[must_use]
    pub fn new(
        series_cap: usize,
        sink: Arc<dyn SnapshotSink>,
        feed_state: Arc<FeedState>,
        event_rx: mpsc::Receiver<FeedEvent>,
        cancel: CancellationToken,
        command_capacity: usize,
    ) -> (Self, FeedHandle) {
        let (command_tx, command_rx) = mpsc::channel(command_capacity);

        let handle = FeedHandle {
            command_tx,
            cancel: cancel.clone(),
        };

        let pipeline = Self {
            watch: WatchSet::new(),
            store: SeriesStore::new(series_cap),
            last_prices: HashMap::new(),
            sink,
            feed_state,
            event_rx,
            command_rx,
            cancel,
            commands_open: true,
        };

        (pipeline, handle)
    }

    /// Run until cancelled or the feed event channel closes.
    pub async fn run(mut self) {
        tracing::info!("feed pipeline started");

        loop {
            if self.commands_open {
                tokio::select! {
                    () = self.cancel.cancelled() => break,
                    event = self.event_rx.recv() => {
                        let Some(event) = event else { break };
                        self.handle_event(event).await;
                    }
                    command = self.command_rx.recv() => {
                        match command {
                            Some(command) => self.handle_command(command).await,
                            // All handles dropped; keep draining events.
                            None => self.commands_open = false,
                        }
                    }
                }
            } else {
                tokio::select! {
                    () = self.cancel.cancelled() => break,
                    event = self.event_rx.recv() => {
                        let Some(event) = event else { break };
                        self.handle_event(event).await;
                    }
                }
            }
        }

        tracing::info!("feed pipeline stopped");
    }

    async fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Connecting => {
                self.sink.publish_status(FeedStatus::Connecting).await;
            }
            FeedEvent::Connected => {
                self.sink.publish_status(FeedStatus::Connected).await;
            }
            FeedEvent::Disconnected {
                reason,
                attempts_left,
                next_retry,
            } => {
                tracing::debug!(reason = %reason, "feed disconnected");
                self.sink
                    .publish_status(FeedStatus::Disconnected {
                        attempts_left,
                        next_retry,
                    })
                    .await;
            }
            FeedEvent::Reconnecting { attempt } => {
                // The client emits Connecting right after this, which is
                // what subscribers see as the status.
                tracing::debug!(attempt, "feed reconnecting");
            }
            FeedEvent::Failed => {
                self.sink.publish_status(FeedStatus::Failed).await;
            }
            FeedEvent::Batch(batch) => self.handle_batch(batch).await,
            FeedEvent::DecodeFailed(detail) => {
                tracing::debug!(detail = %detail, "decode failure reported");
            }
        }
    }

    async fn handle_batch(&mut self, batch: Batch) {
        self.store.update(&batch, &self.watch);

        let quotes: Vec<Quote> = batch
            .points()
            .iter()
            .map(|point| {
                // Direction state is kept only for watched symbols, so the
                // map stays bounded by the watch set.
                let watched = self.watch.contains(&point.symbol);
                let previous = if watched {
                    self.last_prices.get(&point.symbol).copied()
                } else {
                    None
                };
                let direction = Direction::from_change(previous, point.price);
                if watched {
                    self.last_prices.insert(point.symbol.clone(), point.price);
                }

                Quote {
                    symbol: point.symbol.clone(),
                    price: point.price,
                    timestamp: point.timestamp,
                    direction,
                }
            })
            .collect();

        self.sink.publish_snapshot(Snapshot { quotes }).await;
        self.publish_table().await;
    }

    async fn handle_command(&mut self, command: WatchCommand) {
        match command {
            WatchCommand::Replace(watch) => {
                tracing::info!(symbols = watch.len(), "watch set replaced");
                self.store.reset_all();
                self.last_prices.clear();
                for symbol in watch.iter() {
                    self.store.add_symbol(symbol);
                }
                self.watch = watch;
            }
            WatchCommand::Add(symbol) => {
                tracing::info!(symbol = %symbol, "watching symbol");
                self.store.add_symbol(&symbol);
                self.watch.insert(symbol);
            }
            WatchCommand::Remove(symbol) => {
                tracing::info!(symbol = %symbol, "unwatching symbol");
                self.watch.remove(&symbol);
                self.store.remove_symbol(&symbol);
                self.last_prices.remove(&symbol);
            }
        }

        self.feed_state.set_watched_symbols(self.watch.len());
        #[allow(clippy::cast_precision_loss)]
        metrics::set_watched_symbols(self.watch.len() as f64);

        self.publish_table().await;
    }

    async fn publish_table(&self) {
        let table = align::align(&self.store, &self.watch);
        self.sink.publish_table(table).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
