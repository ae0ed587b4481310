//! Text-generation connector.
//!
//! The AI proxy endpoint forwards prompts to a local Ollama server through
//! the [`TextGenerator`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::http::HttpClient;
use crate::traits::{ConnectorConfig, ConnectorError, ConnectorHealth, ConnectorResult};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// Default model name.
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

/// A service that completes prompts.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model used for generation.
    fn model(&self) -> &str;

    /// Generates a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> ConnectorResult<String>;

    /// Checks that the service is reachable.
    async fn health_check(&self) -> ConnectorHealth;
}

/// Settings for the Ollama client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for Ollama's `/api/generate` endpoint.
pub struct OllamaClient {
    http: HttpClient,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> ConnectorResult<Self> {
        let mut connector = ConnectorConfig::new("ollama", config.base_url);
        connector.timeout_secs = config.timeout_secs;
        // Generation is slow and not worth repeating on failure.
        connector.max_retries = 0;

        Ok(Self {
            http: HttpClient::new(connector)?,
            model: config.model,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> ConnectorResult<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let response: GenerateResponse = self.http.post_json("/api/generate", &request).await?;
        debug!(response_len = response.response.len(), "Generation complete");
        Ok(response.response)
    }

    async fn health_check(&self) -> ConnectorHealth {
        match self.http.get("/api/tags").await {
            Ok(_) => ConnectorHealth::Healthy,
            Err(ConnectorError::NotFound(_)) => {
                ConnectorHealth::Degraded("Model listing unavailable".to_string())
            }
            Err(e) => ConnectorHealth::Unhealthy(e.to_string()),
        }
    }
}
