//! HTTP client for a running Aware API server.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use aw_core::Batch;

/// API client for the Aware server.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches server health, including the ledger state.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    /// Lists batches with optional filtering.
    pub async fn list_batches(&self, params: &ListBatchesParams) -> Result<BatchListResponse> {
        let mut query = Vec::new();
        if let Some(status) = &params.status {
            query.push(("status", status.as_str()));
        }
        if let Some(search) = &params.search {
            query.push(("search", search.as_str()));
        }
        if let Some(sort) = &params.sort {
            query.push(("sort", sort.as_str()));
        }

        let response = self
            .client
            .get(self.url("/api/batches"))
            .query(&query)
            .send()
            .await
            .context("Failed to send request")?;

        self.handle_response(response).await
    }

    pub async fn get_batch(&self, id: u64) -> Result<BatchResponse> {
        self.get(&format!("/api/batches/{}", id)).await
    }

    /// Downloads the submissions CSV export.
    pub async fn export_csv(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url("/api/export/csv"))
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }
        response.text().await.context("Failed to read response body")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .context("Failed to send request")?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .context("Failed to parse response body")
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    async fn error_from(status: reqwest::StatusCode, response: reqwest::Response) -> anyhow::Error {
        let error: ApiErrorResponse = response.json().await.unwrap_or_else(|_| ApiErrorResponse {
            code: "UNKNOWN".to_string(),
            message: "Unknown error".to_string(),
            details: None,
        });

        anyhow::anyhow!("API error ({}): {} - {}", status, error.code, error.message)
    }
}

// Request/Response types (matching server DTOs)

#[derive(Debug, Default)]
pub struct ListBatchesParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInfo {
    pub ready: bool,
    pub backend: String,
    pub contract_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ledger: LedgerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_generation: Option<TextGenerationHealth>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextGenerationHealth {
    pub model: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchListResponse {
    pub count: usize,
    pub batches: Vec<Batch>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub batch: Batch,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_with_and_without_generator() {
        let plain: HealthResponse = serde_json::from_value(serde_json::json!({
            "status": "healthy",
            "version": "0.1.0",
            "uptimeSeconds": 12,
            "ledger": { "ready": true, "backend": "memory", "contractAddress": null }
        }))
        .unwrap();
        assert!(plain.text_generation.is_none());

        let degraded: HealthResponse = serde_json::from_value(serde_json::json!({
            "status": "degraded",
            "version": "0.1.0",
            "uptimeSeconds": 12,
            "ledger": { "ready": true, "backend": "memory" },
            "textGeneration": { "model": "llama3.2:3b", "status": "unhealthy", "message": "refused" }
        }))
        .unwrap();
        let generator = degraded.text_generation.unwrap();
        assert_eq!(generator.status, "unhealthy");
        assert_eq!(generator.message.as_deref(), Some("refused"));
    }
}
