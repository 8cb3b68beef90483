//! Tracing subscriber setup
//!
//! Pretty output for local runs, JSON lines in production. `RUST_LOG`
//! always wins over the configured level.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::TelemetryConfig;

/// Dependencies that are noisy at `info`
const QUIET_TARGETS: [&str; 4] = ["sqlx=warn", "hyper=warn", "tungstenite=warn", "tokio_tungstenite=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
        }
    }
}

impl From<&TelemetryConfig> for TracingConfig {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            level: config.log_level.parse().unwrap_or(Level::INFO),
            format: if config.json { LogFormat::Json } else { LogFormat::Pretty },
        }
    }
}

impl TracingConfig {
    /// Filter used when `RUST_LOG` is unset
    fn default_directives(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        std::iter::once(level.as_str())
            .chain(QUIET_TARGETS)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

/// Install the global subscriber with default settings
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::default())
}

/// Install the global subscriber; fails instead of panicking if one exists
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    let (json, pretty) = match config.format {
        LogFormat::Json => (
            Some(fmt::layer().json().flatten_event(true).with_current_span(true)),
            None,
        ),
        LogFormat::Pretty => (None, Some(fmt::layer().with_target(true))),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
