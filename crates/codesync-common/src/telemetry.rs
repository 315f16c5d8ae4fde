//! Tracing setup for codesync binaries.
//!
//! # Usage
//!
//! ```ignore
//! use codesync_common::telemetry::{self, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env("codesync-cli");
//! telemetry::init(config);
//! tracing::info!("client started");
//! ```

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for labeling (e.g., "codesync-cli")
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
    /// Console log level (default: INFO, DEBUG in debug builds)
    pub console_level: Level,
}

impl TelemetryConfig {
    /// Load config from environment variables.
    ///
    /// - `RUST_LOG`: Standard env filter (optional, overrides everything else)
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            service_name: service_name.into(),
            filter: None,
            console_level,
        }
    }

    /// Use `filter` when `RUST_LOG` is unset.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at application startup. Later calls are ignored.
pub fn init(config: TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = config
            .filter
            .clone()
            .unwrap_or_else(|| config.console_level.as_str().to_lowercase());
        EnvFilter::new(directive)
    });

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(service = %config.service_name, "telemetry initialized");
    }
}
