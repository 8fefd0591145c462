//! Port Interfaces
//!
//! Contracts between the application layer and its adapters, following
//! the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`SnapshotSink`]: destination for connection status, snapshots,
//!   and aligned tables; implemented by the broadcast hub.

use async_trait::async_trait;

use crate::domain::series::align::AlignedTable;
use crate::domain::streaming::{FeedStatus, Snapshot};

/// Outbound port for everything the pipeline publishes.
///
/// The rendering layer never touches the pipeline directly; it attaches
/// to whatever adapter implements this sink.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Publish a connection status change.
    async fn publish_status(&self, status: FeedStatus);

    /// Publish the latest-quote snapshot.
    async fn publish_snapshot(&self, snapshot: Snapshot);

    /// Publish a freshly aligned table.
    async fn publish_table(&self, table: AlignedTable);
}
