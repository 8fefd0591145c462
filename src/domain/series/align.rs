//! Series Alignment
//!
//! Merges per-symbol series into a single table keyed by timestamp for
//! simultaneous multi-series display. Pure projection: no state is kept
//! across calls, and the table is recomputed on each update.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SeriesStore;
use crate::domain::watch::{Symbol, WatchSet};

/// One table row: every watched symbol's value at one timestamp, or
/// `None` where that symbol reported nothing at that instant. Absent
/// values are gaps, never zeros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    /// Row timestamp.
    pub timestamp: DateTime<Utc>,
    /// Value per watched symbol at this exact timestamp.
    pub values: BTreeMap<Symbol, Option<f64>>,
}

/// Time-merged projection of the watched series, rows strictly
/// ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignedTable {
    /// Rows in ascending timestamp order.
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Merge the watched series into one table keyed by timestamp.
///
/// Timestamps are ordered by instant, not by their string form, so the
/// ordering is independent of locale or formatting. A row exists for
/// every timestamp at which at least one watched symbol reported a
/// value; identical timestamps across symbols merge into one row. The
/// single-symbol case is just N=1 of the same algorithm.
#[must_use]
pub fn align(store: &SeriesStore, watch: &WatchSet) -> AlignedTable {
    let mut timestamps = BTreeSet::new();
    for symbol in watch.iter() {
        if let Some(series) = store.get(symbol) {
            for point in series {
                timestamps.insert(point.timestamp);
            }
        }
    }

    let rows = timestamps
        .into_iter()
        .map(|timestamp| {
            let values = watch
                .iter()
                .map(|symbol| {
                    let value = store
                        .get(symbol)
                        .and_then(|series| series.iter().find(|p| p.timestamp == timestamp))
                        .map(|p| p.value);
                    (symbol.clone(), value)
                })
                .collect();
            AlignedRow { timestamp, values }
        })
        .collect();

    AlignedTable { rows }
}
