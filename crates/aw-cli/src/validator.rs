//! Configuration validation for the Aware server.
//!
//! Runs before `serve` so that a broken configuration fails at startup
//! instead of on the first request.

use colored::Colorize;
use std::path::Path;

use aw_observability::logging::parse_level;

use crate::config::{AppConfig, LedgerBackend};

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Critical errors that prevent startup.
    pub errors: Vec<String>,
    /// Warnings that should be addressed but don't prevent startup.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Prints the validation result to the console.
    pub fn print(&self) {
        if !self.warnings.is_empty() {
            println!();
            println!("{}", "Configuration Warnings:".yellow().bold());
            for warning in &self.warnings {
                println!("  {} {}", "⚠".yellow(), warning);
            }
        }

        if !self.errors.is_empty() {
            println!();
            println!("{}", "Configuration Errors:".red().bold());
            for error in &self.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            println!("  {} Configuration OK", "✓".green());
        }
    }
}

/// Validates application configuration before startup.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the application configuration.
    pub fn validate(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_server(config, &mut result);
        Self::validate_storage(config, &mut result);
        Self::validate_ledger(config, &mut result);
        Self::validate_text_generation(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_server(config: &AppConfig, result: &mut ValidationResult) {
        let server = &config.server;

        if format!("{}:{}", server.host, server.port)
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            result.add_error(format!(
                "Invalid bind address '{}:{}'. server.host must be an IP address",
                server.host, server.port
            ));
        }

        if server.session_expiry_hours <= 0 {
            result.add_error(format!(
                "server.session_expiry_hours must be positive, got {}",
                server.session_expiry_hours
            ));
        }

        if !server.session_secure {
            result.add_warning(
                "Session cookies are not marked Secure. Set server.session_secure \
                 when serving over HTTPS.",
            );
        }
    }

    fn validate_storage(config: &AppConfig, result: &mut ValidationResult) {
        let path = &config.storage.spreadsheet_path;

        if path.as_os_str().is_empty() {
            result.add_error("storage.spreadsheet_path must not be empty");
            return;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => {}
            _ => result.add_warning(format!(
                "Spreadsheet path '{}' does not end in .xlsx",
                path.display()
            )),
        }

        if path.is_dir() {
            result.add_error(format!(
                "Spreadsheet path '{}' is a directory",
                path.display()
            ));
        } else if !path.exists() {
            let parent = path.parent().unwrap_or(Path::new("."));
            if !parent.as_os_str().is_empty() && !parent.exists() {
                result.add_warning(format!(
                    "Directory '{}' does not exist yet and will be created",
                    parent.display()
                ));
            }
        }
    }

    fn validate_ledger(config: &AppConfig, result: &mut ValidationResult) {
        let ledger = &config.ledger;

        match ledger.backend {
            LedgerBackend::Memory => {
                result.add_warning(
                    "Using the in-memory ledger. Accounts and batches are lost on restart.",
                );
                if !ledger.seed_demo_data {
                    result.add_warning(
                        "In-memory ledger without demo data starts with no accounts; \
                         register users through /api/auth/register.",
                    );
                }
            }
            LedgerBackend::Gateway => {
                if ledger.gateway_url.is_empty() {
                    result.add_error(
                        "Gateway ledger requires ledger.gateway_url (e.g., http://localhost:8545)",
                    );
                } else if !is_http_url(&ledger.gateway_url) {
                    result.add_error(format!(
                        "Invalid ledger.gateway_url '{}'. Must start with http:// or https://",
                        ledger.gateway_url
                    ));
                }
                if ledger.gateway_api_key.is_none() {
                    result.add_warning("No ledger.gateway_api_key set; gateway calls are unauthenticated.");
                }
            }
        }

        if ledger.timeout_secs == 0 {
            result.add_error("ledger.timeout_secs must be greater than zero");
        }
    }

    fn validate_text_generation(config: &AppConfig, result: &mut ValidationResult) {
        let generation = &config.text_generation;

        if !generation.enabled {
            result.add_warning("Text generation is disabled; /api/predict will return 503.");
            return;
        }

        if !is_http_url(&generation.base_url) {
            result.add_error(format!(
                "Invalid text_generation.base_url '{}'. Must start with http:// or https://",
                generation.base_url
            ));
        }
        if generation.model.trim().is_empty() {
            result.add_error("text_generation.model must not be empty");
        }
    }

    fn validate_logging(config: &AppConfig, result: &mut ValidationResult) {
        if parse_level(&config.logging.level).is_none() {
            result.add_warning(format!(
                "Unknown log level '{}', falling back to info",
                config.logging.level
            ));
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
