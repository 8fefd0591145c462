//! Shared Feed State
//!
//! Runtime connection-state and counter tracking shared between the
//! feed client, the pipeline, and the health endpoint. All fields are
//! updated from the owning task and read concurrently by health checks.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;

/// Lifecycle state of the streaming connection.
///
/// Exactly one client instance drives these transitions; the socket
/// handle is owned exclusively by that client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection attempt has started.
    #[default]
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and processing messages.
    Open,
    /// Caller-initiated teardown in progress.
    Closing,
    /// Connection closed.
    Closed,
}

impl ConnectionState {
    /// Stable string form for health output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

/// Shared tracker for the single feed connection.
#[derive(Debug, Default)]
pub struct FeedState {
    state: RwLock<ConnectionState>,
    messages_received: AtomicU64,
    reconnect_attempts: AtomicU32,
    watched_symbols: AtomicUsize,
    failed: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl FeedState {
    /// Create a fresh tracker in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state transition.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Count one inbound message.
    pub fn increment_messages(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Total inbound messages since startup.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Count one reconnection attempt.
    pub fn increment_reconnect_attempts(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the attempt counter after a successful open.
    pub fn reset_reconnect_attempts(&self) {
        self.reconnect_attempts.store(0, Ordering::Relaxed);
    }

    /// Reconnection attempts since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Record the current watch set size.
    pub fn set_watched_symbols(&self, count: usize) {
        self.watched_symbols.store(count, Ordering::Relaxed);
    }

    /// Current watch set size.
    #[must_use]
    pub fn watched_symbols(&self) -> usize {
        self.watched_symbols.load(Ordering::Relaxed)
    }

    /// Mark the connection as terminally failed (retry budget spent).
    pub fn set_failed(&self) {
        self.failed.store(true, Ordering::Relaxed);
    }

    /// Whether the connection has terminally failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }

    /// Record the most recent error detail.
    pub fn set_last_error(&self, error: impl Into<String>) {
        *self.last_error.write() = Some(error.into());
    }

    /// Most recent error detail, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }
}
