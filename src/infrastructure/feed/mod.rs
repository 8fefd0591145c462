//! Ticker Feed Integration
//!
//! WebSocket client for the live ticker feed: connection lifecycle with
//! bounded-backoff reconnection, wire message types, the snapshot codec,
//! and shared connection state for health reporting.

pub mod client;
pub mod codec;
pub mod messages;
pub mod reconnect;
pub mod state;

pub use client::{FeedClient, FeedClientConfig, FeedClientError};
pub use codec::{CodecError, SnapshotCodec};
pub use messages::TickMessage;
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use state::{ConnectionState, FeedState};
