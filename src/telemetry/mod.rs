//! Logging setup for zodiac-admin
//!
//! Installs a `tracing_subscriber` registry with a level filter and either a
//! JSON or a human-readable fmt layer.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Telemetry error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TelemetryError {
    /// A global subscriber is already installed
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Map a configured level name to a tracing level (unknown names become INFO)
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Whether the configured format selects JSON output
pub fn is_json_format(format: &str) -> bool {
    !format.eq_ignore_ascii_case("pretty") && !format.eq_ignore_ascii_case("text")
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` directives, when present, refine the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(parse_level(&config.level)).into())
        .from_env_lossy();

    let json = is_json_format(&config.format);

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))
}
