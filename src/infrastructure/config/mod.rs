//! Configuration Module
//!
//! Configuration loading for the feed service.

mod settings;

pub use settings::{
    BroadcastSettings, ConfigError, DEFAULT_WS_URL, FeedConfig, ServerSettings, WebSocketSettings,
};
