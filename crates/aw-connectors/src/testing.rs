//! Test doubles and helpers for connector consumers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::text_generation::TextGenerator;
use crate::traits::{AuthConfig, ConnectorConfig, ConnectorError, ConnectorHealth, ConnectorResult};

/// Creates a test connector config with sensible defaults.
pub fn test_connector_config(name: &str, base_url: &str) -> ConnectorConfig {
    ConnectorConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        auth: AuthConfig::None,
        timeout_secs: 5,
        max_retries: 0,
        headers: HashMap::new(),
    }
}

/// How a [`MockTextGenerator`] answers.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Returns the prompt unchanged.
    Echo,
    /// Returns the same text for every prompt.
    Fixed(String),
    /// Fails every call with the given error.
    Fail(ConnectorError),
}

/// In-memory text generator that records prompts.
#[derive(Clone)]
pub struct MockTextGenerator {
    reply: MockReply,
    prompts: Arc<RwLock<Vec<String>>>,
}

impl MockTextGenerator {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn echo() -> Self {
        Self::new(MockReply::Echo)
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(MockReply::Fixed(text.into()))
    }

    pub fn failing(error: ConnectorError) -> Self {
        Self::new(MockReply::Fail(error))
    }

    /// Prompts received so far.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.read().await.clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> ConnectorResult<String> {
        self.prompts.write().await.push(prompt.to_string());
        match &self.reply {
            MockReply::Echo => Ok(prompt.to_string()),
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Fail(error) => Err(error.clone()),
        }
    }

    async fn health_check(&self) -> ConnectorHealth {
        match &self.reply {
            MockReply::Fail(error) => ConnectorHealth::Unhealthy(error.to_string()),
            _ => ConnectorHealth::Healthy,
        }
    }
}
