#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Tickfeed - Live Ticker Aggregation Service
//!
//! Maintains a single resilient WebSocket connection to a live ticker
//! feed, aggregates decoded prices into bounded per-symbol series, and
//! fans out statuses, snapshots, and timestamp-aligned tables to
//! downstream subscribers.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core aggregation logic and data types
//!   - `streaming`: Feed data types (points, batches, quotes, events)
//!   - `series`: Bounded per-symbol series and timestamp alignment
//!   - `watch`: The watched-symbol set
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interfaces for publishing outputs
//!   - `services`: The event-driven aggregation pipeline
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: WebSocket client with bounded-backoff reconnection
//!   - `broadcast`: Channel-based output distribution
//!   - `config`: Configuration loading
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//! Ticker WS ──► Feed Client ──► Pipeline ──► Broadcast ──► Subscriber 1
//!               (decode)        (series,     Channels  ──► Subscriber 2
//!                               align)                 ──► Subscriber N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core aggregation types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::series::align::{AlignedRow, AlignedTable, align};
pub use domain::series::{DEFAULT_SERIES_CAP, SeriesPoint, SeriesStore};
pub use domain::streaming::{
    Batch, DataPoint, Direction, FeedEvent, FeedStatus, Quote, Snapshot,
};
pub use domain::watch::{Symbol, WatchSet};

// Application services and ports
pub use application::ports::SnapshotSink;
pub use application::services::{FeedHandle, FeedPipeline, HandleError, WatchCommand};

// Infrastructure config
pub use infrastructure::config::{
    BroadcastSettings, ConfigError, DEFAULT_WS_URL, FeedConfig, ServerSettings, WebSocketSettings,
};

// Feed client (for integration tests)
pub use infrastructure::feed::{
    CodecError, ConnectionState, FeedClient, FeedClientConfig, FeedClientError, FeedState,
    ReconnectConfig, ReconnectPolicy, SnapshotCodec, TickMessage,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Broadcast hub (for integration tests)
pub use infrastructure::broadcast::{
    BroadcastConfig, BroadcastStats, FeedBroadcastHub, SharedFeedBroadcastHub,
};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, init as init_telemetry};
