//! Broadcast Channel Adapters
//!
//! Implements output distribution using tokio broadcast channels for
//! efficient fan-out to multiple subscribers.
//!
//! # Architecture
//!
//! The `FeedBroadcastHub` provides separate channels for each output:
//! - Connection status transitions
//! - Price snapshots decoded from the feed
//! - Aligned series tables rebuilt after each update
//!
//! Each channel supports multiple receivers with configurable capacity.
//! The hub is also the concrete [`SnapshotSink`] the pipeline publishes
//! through.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::application::ports::SnapshotSink;
use crate::domain::series::align::AlignedTable;
use crate::domain::streaming::{FeedStatus, Snapshot};
use crate::infrastructure::config::BroadcastSettings;

// =============================================================================
// Broadcast Messages
// =============================================================================

/// Connection status broadcast message.
#[derive(Debug, Clone)]
pub struct StatusBroadcast {
    /// The status transition.
    pub status: FeedStatus,
}

/// Price snapshot broadcast message.
#[derive(Debug, Clone)]
pub struct SnapshotBroadcast {
    /// The decoded snapshot.
    pub snapshot: Snapshot,
}

/// Aligned table broadcast message.
#[derive(Debug, Clone)]
pub struct TableBroadcast {
    /// The rebuilt table.
    pub table: AlignedTable,
}

// =============================================================================
// Broadcast Hub
// =============================================================================

/// Configuration for broadcast channel capacities.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    /// Capacity for the status channel.
    pub status_capacity: usize,
    /// Capacity for the snapshot channel.
    pub snapshots_capacity: usize,
    /// Capacity for the table channel.
    pub tables_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            status_capacity: 64,
            snapshots_capacity: 1_024,
            tables_capacity: 64,
        }
    }
}

impl From<BroadcastSettings> for BroadcastConfig {
    fn from(settings: BroadcastSettings) -> Self {
        Self {
            status_capacity: settings.status_capacity,
            snapshots_capacity: settings.snapshots_capacity,
            tables_capacity: settings.tables_capacity,
        }
    }
}

/// Central hub for all broadcast channels.
///
/// Provides separate channels for statuses, snapshots, and tables with
/// configurable capacities. Supports multiple receivers per channel.
#[derive(Debug)]
pub struct FeedBroadcastHub {
    status_tx: broadcast::Sender<StatusBroadcast>,
    snapshots_tx: broadcast::Sender<SnapshotBroadcast>,
    tables_tx: broadcast::Sender<TableBroadcast>,
}

impl FeedBroadcastHub {
    /// Create a new broadcast hub with the given configuration.
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            status_tx: broadcast::channel(config.status_capacity).0,
            snapshots_tx: broadcast::channel(config.snapshots_capacity).0,
            tables_tx: broadcast::channel(config.tables_capacity).0,
        }
    }

    /// Create a new broadcast hub with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BroadcastConfig::default())
    }

    // =========================================================================
    // Status Channel
    // =========================================================================

    /// Send a status transition to all subscribers.
    ///
    /// Returns the number of receivers that received the message, or
    /// `None` if there are no active receivers.
    #[must_use]
    pub fn send_status(&self, status: FeedStatus) -> Option<usize> {
        self.status_tx.send(StatusBroadcast { status }).ok()
    }

    /// Get a new receiver for status transitions.
    #[must_use]
    pub fn status_rx(&self) -> broadcast::Receiver<StatusBroadcast> {
        self.status_tx.subscribe()
    }

    /// Get the number of active status receivers.
    #[must_use]
    pub fn status_receiver_count(&self) -> usize {
        self.status_tx.receiver_count()
    }

    // =========================================================================
    // Snapshot Channel
    // =========================================================================

    /// Send a snapshot to all subscribers.
    #[must_use]
    pub fn send_snapshot(&self, snapshot: Snapshot) -> Option<usize> {
        self.snapshots_tx.send(SnapshotBroadcast { snapshot }).ok()
    }

    /// Get a new receiver for snapshots.
    #[must_use]
    pub fn snapshots_rx(&self) -> broadcast::Receiver<SnapshotBroadcast> {
        self.snapshots_tx.subscribe()
    }

    /// Get the number of active snapshot receivers.
    #[must_use]
    pub fn snapshots_receiver_count(&self) -> usize {
        self.snapshots_tx.receiver_count()
    }

    // =========================================================================
    // Table Channel
    // =========================================================================

    /// Send an aligned table to all subscribers.
    #[must_use]
    pub fn send_table(&self, table: AlignedTable) -> Option<usize> {
        self.tables_tx.send(TableBroadcast { table }).ok()
    }

    /// Get a new receiver for aligned tables.
    #[must_use]
    pub fn tables_rx(&self) -> broadcast::Receiver<TableBroadcast> {
        self.tables_tx.subscribe()
    }

    /// Get the number of active table receivers.
    #[must_use]
    pub fn tables_receiver_count(&self) -> usize {
        self.tables_tx.receiver_count()
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Get statistics about all channels.
    #[must_use]
    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            status_receivers: self.status_receiver_count(),
            snapshot_receivers: self.snapshots_receiver_count(),
            table_receivers: self.tables_receiver_count(),
        }
    }
}

#[async_trait]
impl SnapshotSink for FeedBroadcastHub {
    async fn publish_status(&self, status: FeedStatus) {
        let _ = self.send_status(status);
    }

    async fn publish_snapshot(&self, snapshot: Snapshot) {
        let _ = self.send_snapshot(snapshot);
    }

    async fn publish_table(&self, table: AlignedTable) {
        let _ = self.send_table(table);
    }
}

/// Shared broadcast hub reference.
pub type SharedFeedBroadcastHub = Arc<FeedBroadcastHub>;

/// Statistics about broadcast channels.
#[derive(Debug, Clone, Default)]
pub struct BroadcastStats {
    /// Number of status receivers.
    pub status_receivers: usize,
    /// Number of snapshot receivers.
    pub snapshot_receivers: usize,
    /// Number of table receivers.
    pub table_receivers: usize,
}

impl BroadcastStats {
    /// Get total number of receivers across all channels.
    #[must_use]
    pub const fn total_receivers(&self) -> usize {
        self.status_receivers + self.snapshot_receivers + self.table_receivers
    }
}

// =============================================================================
// Tests
// =============================================================================
