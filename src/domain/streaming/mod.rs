//! Canonical Feed Types
//!
//! Codec-agnostic internal representation of feed data: decoded data
//! points, per-message batches, the latest-quote snapshot published to
//! renderers, and the event/status vocabulary shared between the
//! connection client and the pipeline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::watch::Symbol;

// =============================================================================
// Data Points and Batches
// =============================================================================

/// One decoded feed record. Immutable once created; produced only by
/// the snapshot codec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Price value.
    pub price: f64,
    /// Record timestamp (feed-supplied, or receive time if the feed
    /// omitted one).
    pub timestamp: DateTime<Utc>,
}

/// One decoded inbound message: an ordered sequence of data points
/// sharing one arrival event. Symbols within a batch are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Batch {
    points: Vec<DataPoint>,
}

impl Batch {
    /// Build a batch from decoded points, keeping the first record when
    /// a symbol appears more than once in the same message.
    #[must_use]
    pub fn from_points(points: Vec<DataPoint>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let points = points
            .into_iter()
            .filter(|p| seen.insert(p.symbol.clone()))
            .collect();
        Self { points }
    }

    /// The points in arrival order.
    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Number of points in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// =============================================================================
// Snapshot (latest quotes)
// =============================================================================

/// Direction of the latest price change for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Price rose since the previous observation.
    Up,
    /// Price fell since the previous observation.
    Down,
    /// Price unchanged, or first observation.
    Flat,
}

impl Direction {
    /// Compare the new price against the previous one.
    #[must_use]
    pub fn from_change(previous: Option<f64>, current: f64) -> Self {
        match previous {
            Some(prev) if current > prev => Self::Up,
            Some(prev) if current < prev => Self::Down,
            _ => Self::Flat,
        }
    }
}

/// Latest observed quote for one watched symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Latest price.
    pub price: f64,
    /// Timestamp of the latest observation.
    pub timestamp: DateTime<Utc>,
    /// Price direction relative to the previous observation.
    pub direction: Direction,
}

/// Latest-quote snapshot across the watch set, published to the
/// rendering layer after each processed batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Latest quote per watched symbol, sorted by symbol.
    pub quotes: Vec<Quote>,
}

// =============================================================================
// Events and Status
// =============================================================================

/// Events emitted by the feed client toward the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A connection attempt is starting. Emitted before every dial,
    /// including the very first one.
    Connecting,
    /// Connection established.
    Connected,
    /// Connection lost uncleanly; a retry is scheduled.
    Disconnected {
        /// Why the connection dropped.
        reason: String,
        /// Retry attempts remaining, `None` when unlimited.
        attempts_left: Option<u32>,
        /// Delay before the next connection attempt.
        next_retry: Duration,
    },
    /// A reconnection attempt is starting.
    Reconnecting {
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// A decoded batch of data points.
    Batch(Batch),
    /// One message failed to decode; the connection is unaffected.
    DecodeFailed(String),
    /// Retry budget exhausted; no further automatic attempts.
    Failed,
}

/// Connection status published to the external layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and receiving data.
    Connected,
    /// Disconnected, retry pending.
    Disconnected {
        /// Retry attempts remaining, `None` when unlimited.
        attempts_left: Option<u32>,
        /// Delay before the next attempt.
        next_retry: Duration,
    },
    /// Terminal failure; explicit re-initiation required.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(symbol: &str, price: f64) -> DataPoint {
        DataPoint {
            symbol: symbol.to_string(),
            price,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn batch_deduplicates_symbols_first_wins() {
        let batch = Batch::from_points(vec![
            point("AAPL", 150.0),
            point("MSFT", 300.0),
            point("AAPL", 151.0),
        ]);
        assert_eq!(batch.len(), 2);
        assert!((batch.points()[0].price - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn direction_from_change() {
        assert_eq!(Direction::from_change(None, 10.0), Direction::Flat);
        assert_eq!(Direction::from_change(Some(9.0), 10.0), Direction::Up);
        assert_eq!(Direction::from_change(Some(11.0), 10.0), Direction::Down);
        assert_eq!(Direction::from_change(Some(10.0), 10.0), Direction::Flat);
    }

    #[test]
    fn empty_batch() {
        let batch = Batch::from_points(vec![]);
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
