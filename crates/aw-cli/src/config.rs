//! Configuration loading for the Aware CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use aw_observability::LoggingConfig;

const REDACTED: &str = "***REDACTED***";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub text_generation: TextGenerationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Creates a copy with secrets redacted.
    pub fn redact_secrets(&self) -> Self {
        let mut config = self.clone();
        if config.ledger.gateway_api_key.is_some() {
            config.ledger.gateway_api_key = Some(REDACTED.to_string());
        }
        config
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve Swagger UI at `/swagger-ui`.
    #[serde(default = "default_true")]
    pub swagger: bool,

    /// Send the session cookie over HTTPS only.
    #[serde(default)]
    pub session_secure: bool,

    #[serde(default = "default_session_expiry_hours")]
    pub session_expiry_hours: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_session_expiry_hours() -> i64 {
    24
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            swagger: true,
            session_secure: false,
            session_expiry_hours: default_session_expiry_hours(),
        }
    }
}

/// Spreadsheet storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_spreadsheet_path")]
    pub spreadsheet_path: PathBuf,
}

fn default_spreadsheet_path() -> PathBuf {
    PathBuf::from("data/submissions.xlsx")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            spreadsheet_path: default_spreadsheet_path(),
        }
    }
}

/// Which ledger implementation backs accounts and batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// In-process ledger; state is lost on restart.
    #[default]
    Memory,
    /// HTTP contract gateway.
    Gateway,
}

impl std::fmt::Display for LedgerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerBackend::Memory => write!(f, "memory"),
            LedgerBackend::Gateway => write!(f, "gateway"),
        }
    }
}

/// Ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    /// Base URL of the contract gateway.
    #[serde(default)]
    pub gateway_url: String,

    /// Bearer token for the gateway.
    #[serde(default)]
    pub gateway_api_key: Option<String>,

    #[serde(default = "default_ledger_timeout")]
    pub timeout_secs: u64,

    /// Retries for gateway reads. Transactions are sent once.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Register the demo accounts and sample batches on startup.
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
}

fn default_ledger_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::Memory,
            gateway_url: String::new(),
            gateway_api_key: None,
            timeout_secs: default_ledger_timeout(),
            max_retries: default_max_retries(),
            seed_demo_data: true,
        }
    }
}

/// Text generation proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextGenerationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_ollama_url(),
            model: default_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ledger.backend, LedgerBackend::Memory);
        assert!(config.ledger.seed_demo_data);
        assert_eq!(config.text_generation.model, "llama3.2:3b");
        assert_eq!(
            config.storage.spreadsheet_path,
            PathBuf::from("data/submissions.xlsx")
        );
    }

    #[test]
    fn test_redact_secrets() {
        let mut config = AppConfig::default();
        config.ledger.gateway_api_key = Some("gateway-token".to_string());

        let redacted = config.redact_secrets();
        assert_eq!(redacted.ledger.gateway_api_key.as_deref(), Some(REDACTED));
        assert_eq!(
            config.ledger.gateway_api_key.as_deref(),
            Some("gateway-token")
        );
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  port: 8088
  session_secure: true

storage:
  spreadsheet_path: /var/lib/aware/submissions.xlsx

ledger:
  backend: gateway
  gateway_url: http://localhost:8545
  seed_demo_data: false

logging:
  level: debug
  json: true
"#;

        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.session_secure);
        assert_eq!(config.ledger.backend, LedgerBackend::Gateway);
        assert!(!config.ledger.seed_demo_data);
        assert_eq!(config.ledger.max_retries, 3);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert!(config.text_generation.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aware.yaml");
        std::fs::write(&path, "text_generation:\n  enabled: false\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert!(!config.text_generation.enabled);

        assert!(AppConfig::load(&dir.path().join("missing.yaml")).is_err());
    }
}
