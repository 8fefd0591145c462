//! Tracing Setup
//!
//! Configures the tracing subscriber for structured console logging.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Standard env-filter directives; defaults keep the
//!   crate at `info` and the HTTP stack quiet.
//! - `TICKFEED_LOG_JSON`: Set to "true" for JSON-formatted log lines.
//!
//! # Usage
//!
//! ```ignore
//! use tickfeed::infrastructure::telemetry;
//!
//! // Initialize once at startup.
//! telemetry::init();
//!
//! #[tracing::instrument]
//! fn process_message() {
//!     tracing::info!("Processing message");
//! }
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Emit JSON log lines instead of human-readable ones.
    pub json_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { json_output: false }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let json_output = std::env::var("TICKFEED_LOG_JSON")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Self { json_output }
    }
}

/// Initialize tracing with default configuration from environment.
pub fn init() {
    init_with_config(&TelemetryConfig::from_env());
}

/// Initialize tracing with custom configuration.
#[allow(clippy::expect_used)]
pub fn init_with_config(config: &TelemetryConfig) {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(
            "tickfeed=info"
                .parse()
                .expect("static directive 'tickfeed=info' is valid"),
        )
        .add_directive(
            "tungstenite=warn"
                .parse()
                .expect("static directive 'tungstenite=warn' is valid"),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("static directive 'hyper=warn' is valid"),
        );

    if config.json_output {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_human_readable() {
        let config = TelemetryConfig::default();
        assert!(!config.json_output);
    }

    #[test]
    fn json_layer_is_available() {
        // The JSON output path needs the subscriber's json formatter.
        let _layer = tracing_subscriber::fmt::layer::<tracing_subscriber::Registry>().json();
    }
}
