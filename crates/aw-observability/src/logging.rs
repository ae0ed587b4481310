//! Logging setup.
//!
//! Structured logging through `tracing`, pretty or JSON, filtered by
//! `RUST_LOG` when set and by the configured level otherwise.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Crates whose events pass the default filter.
const CRATES: &[&str] = &[
    "aw_core",
    "aw_connectors",
    "aw_observability",
    "aw_api",
    "aw_cli",
    "aware",
    "tower_http",
];

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level name: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    pub include_spans: bool,
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            include_spans: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json: false,
            include_spans: true,
            include_location: true,
        }
    }

    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            include_spans: false,
            include_location: false,
        }
    }

    /// Parsed level, falling back to `INFO` for unknown names.
    pub fn level(&self) -> Level {
        parse_level(&self.level).unwrap_or(Level::INFO)
    }

    /// Default filter directive covering the platform crates.
    pub fn filter_directive(&self) -> String {
        let level = self.level().to_string().to_lowercase();
        CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parses a level name case-insensitively.
pub fn parse_level(name: &str) -> Option<Level> {
    name.trim().parse::<Level>().ok()
}

/// Initializes logging with default configuration.
pub fn init_logging() -> Result<(), TryInitError> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initializes the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level(), Level::INFO);
        assert!(!config.json);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.json);
        assert!(!config.include_location);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);

        let config = LoggingConfig {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_filter_directive() {
        let config = LoggingConfig::development();
        let directive = config.filter_directive();
        assert!(directive.starts_with("aw_core=debug,"));
        assert!(directive.contains("aw_api=debug"));
    }
}
