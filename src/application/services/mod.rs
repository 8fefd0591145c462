//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `FeedPipeline`: Consumes feed events, maintains series state, and
//!   publishes statuses, snapshots, and aligned tables
//! - `FeedHandle`: Control surface for watch-set changes and shutdown

mod pipeline;

pub use pipeline::{FeedHandle, FeedPipeline, HandleError, WatchCommand};
