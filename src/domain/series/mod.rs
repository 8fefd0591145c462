//! Series Aggregation
//!
//! Maintains a bounded running series per watched symbol. Each update
//! appends the batch's points for watched symbols and evicts the oldest
//! entries beyond the cap. Series for symbols outside the current watch
//! set are purged entirely, not merely hidden.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::streaming::Batch;
use crate::domain::watch::{Symbol, WatchSet};

pub mod align;

/// Default maximum entries retained per series.
pub const DEFAULT_SERIES_CAP: usize = 50;

/// One entry in a symbol's series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Observation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Observed value.
    pub value: f64,
}

/// Bounded per-symbol series store.
///
/// Owned exclusively by the pipeline; the watch set passed to
/// [`SeriesStore::update`] is treated as a snapshot for that update.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    cap: usize,
    series: HashMap<Symbol, VecDeque<SeriesPoint>>,
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAP)
    }
}

impl SeriesStore {
    /// Create a store with the given per-series cap.
    ///
    /// A cap of zero is clamped to one so an update always retains the
    /// latest observation.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            series: HashMap::new(),
        }
    }

    /// Per-series cap.
    #[must_use]
    pub const fn cap(&self) -> usize {
        self.cap
    }

    /// Apply one batch under the given watch set.
    ///
    /// Points for watched symbols are appended (oldest evicted beyond
    /// the cap); series for unwatched symbols are dropped. A batch that
    /// omits a watched symbol leaves that symbol's series untouched --
    /// representing the gap is the aligner's job.
    pub fn update(&mut self, batch: &Batch, watch: &WatchSet) {
        for point in batch.points() {
            if !watch.contains(&point.symbol) {
                continue;
            }
            let series = self.series.entry(point.symbol.clone()).or_default();
            series.push_back(SeriesPoint {
                timestamp: point.timestamp,
                value: point.price,
            });
            while series.len() > self.cap {
                series.pop_front();
            }
        }

        self.series.retain(|symbol, _| watch.contains(symbol));
    }

    /// Start tracking a symbol with an empty series.
    ///
    /// Re-adding a previously removed symbol never resurrects old data.
    pub fn add_symbol(&mut self, symbol: &str) {
        self.series.entry(symbol.to_string()).or_default();
    }

    /// Drop a symbol's series entirely.
    pub fn remove_symbol(&mut self, symbol: &str) {
        self.series.remove(symbol);
    }

    /// Clear every series. Invoked when the watch set is replaced
    /// wholesale.
    pub fn reset_all(&mut self) {
        self.series.clear();
    }

    /// The series for one symbol, if tracked.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&VecDeque<SeriesPoint>> {
        self.series.get(symbol)
    }

    /// Number of tracked symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Check whether no symbols are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Iterate over tracked symbols in arbitrary order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.series.keys()
    }
}
