//! Application Layer - Use cases and port definitions.
//!
//! This layer orchestrates the domain logic and defines the port
//! interfaces through which the feed reaches external systems.

/// Port interfaces for external systems (broadcast, rendering).
pub mod ports;

/// Application services driving aggregation and publication.
pub mod services;
