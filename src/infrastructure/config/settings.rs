//! Feed Configuration Settings
//!
//! Configuration types for the feed service, loaded from environment
//! variables. Every variable has a sensible default so a bare
//! `tickfeed` run connects to a local feed out of the box.

use std::time::Duration;

/// Default WebSocket endpoint for the ticker feed.
pub const DEFAULT_WS_URL: &str = "ws://localhost:4000/ws";

/// WebSocket connection settings.
#[derive(Debug, Clone)]
pub struct WebSocketSettings {
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub reconnect_delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_initial: Duration::from_millis(1000),
            reconnect_delay_max: Duration::from_secs(30),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 10,
        }
    }
}

/// Broadcast channel settings.
#[derive(Debug, Clone)]
pub struct BroadcastSettings {
    /// Capacity of the status broadcast channel.
    pub status_capacity: usize,
    /// Capacity of the snapshot broadcast channel.
    pub snapshots_capacity: usize,
    /// Capacity of the table broadcast channel.
    pub tables_capacity: usize,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            status_capacity: 64,
            snapshots_capacity: 1_024,
            tables_capacity: 64,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Health check HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { health_port: 8082 }
    }
}

/// Complete feed service configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// WebSocket URL of the ticker feed.
    pub ws_url: String,
    /// Symbols to watch at startup.
    pub symbols: Vec<String>,
    /// Per-symbol series capacity.
    pub series_cap: usize,
    /// Server port settings.
    pub server: ServerSettings,
    /// WebSocket connection settings.
    pub websocket: WebSocketSettings,
    /// Broadcast channel settings.
    pub broadcast: BroadcastSettings,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            symbols: Vec::new(),
            series_cap: crate::domain::series::DEFAULT_SERIES_CAP,
            server: ServerSettings::default(),
            websocket: WebSocketSettings::default(),
            broadcast: BroadcastSettings::default(),
        }
    }
}

impl FeedConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `TICKFEED_WS_URL` is set to something that is
    /// not a `ws://` or `wss://` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ws_url = std::env::var("TICKFEED_WS_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WS_URL.to_string());

        if !ws_url.starts_with("ws://") && !ws_url.starts_with("wss://") {
            return Err(ConfigError::InvalidUrl(ws_url));
        }

        let symbols = std::env::var("TICKFEED_SYMBOLS")
            .map(|v| parse_symbol_list(&v))
            .unwrap_or_default();

        let series_cap = parse_env_usize(
            "TICKFEED_SERIES_CAP",
            crate::domain::series::DEFAULT_SERIES_CAP,
        );
        if series_cap == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TICKFEED_SERIES_CAP".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let server = ServerSettings {
            health_port: parse_env_u16(
                "TICKFEED_HEALTH_PORT",
                ServerSettings::default().health_port,
            ),
        };

        let websocket = WebSocketSettings {
            reconnect_delay_initial: parse_env_duration_millis(
                "TICKFEED_RECONNECT_DELAY_INITIAL_MS",
                WebSocketSettings::default().reconnect_delay_initial,
            ),
            reconnect_delay_max: parse_env_duration_secs(
                "TICKFEED_RECONNECT_DELAY_MAX_SECS",
                WebSocketSettings::default().reconnect_delay_max,
            ),
            reconnect_delay_multiplier: parse_env_f64(
                "TICKFEED_RECONNECT_DELAY_MULTIPLIER",
                WebSocketSettings::default().reconnect_delay_multiplier,
            ),
            max_reconnect_attempts: parse_env_u32(
                "TICKFEED_MAX_RECONNECT_ATTEMPTS",
                WebSocketSettings::default().max_reconnect_attempts,
            ),
        };

        let broadcast = BroadcastSettings {
            status_capacity: parse_env_usize(
                "TICKFEED_STATUS_CAPACITY",
                BroadcastSettings::default().status_capacity,
            ),
            snapshots_capacity: parse_env_usize(
                "TICKFEED_SNAPSHOTS_CAPACITY",
                BroadcastSettings::default().snapshots_capacity,
            ),
            tables_capacity: parse_env_usize(
                "TICKFEED_TABLES_CAPACITY",
                BroadcastSettings::default().tables_capacity,
            ),
        };

        Ok(Self {
            ws_url,
            symbols,
            series_cap,
            server,
            websocket,
            broadcast,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Feed URL is not a WebSocket URL.
    #[error("TICKFEED_WS_URL must start with ws:// or wss://, got: {0}")]
    InvalidUrl(String),
    /// A variable was set to an unusable value.
    #[error("environment variable {key} is invalid: {reason}")]
    InvalidValue {
        /// The variable name.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Split a comma-separated symbol list, dropping blanks and whitespace.
fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
