//! # aw-observability
//!
//! Logging and metrics infrastructure for the Aware platform.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
pub use metrics::{install_prometheus_recorder, MetricsCollector};
