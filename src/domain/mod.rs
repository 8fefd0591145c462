//! Domain Layer - Core feed types and aggregation logic.
//!
//! This layer contains the core time-series model with no I/O
//! dependencies. All types here are pure Rust with serialization
//! support where the rendering layer needs it.

/// Canonical feed types (data points, batches, snapshots, events).
pub mod streaming;

/// Bounded per-symbol series aggregation and time alignment.
pub mod series;

/// Watch set tracking.
pub mod watch;
