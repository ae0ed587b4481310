//! HTTP utilities for connectors.
//!
//! `HttpClient` wraps `reqwest` with base-URL handling, authentication and
//! bounded exponential-backoff retries for idempotent calls.

use crate::traits::{AuthConfig, ConnectorConfig, ConnectorError, ConnectorResult};
use rand::Rng;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// HTTP client with retry support.
pub struct HttpClient {
    client: Client,
    config: ConnectorConfig,
}

impl HttpClient {
    /// Creates a new HTTP client from connector configuration.
    pub fn new(config: ConnectorConfig) -> ConnectorResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::try_from(key.as_str()),
                reqwest::header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, val);
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(headers)
            .build()
            .map_err(|e| ConnectorError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Builds a URL from a path.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Builds a URL under the base from raw path segments, percent-encoding
    /// each one so user-supplied values cannot add path components.
    pub fn segment_url(&self, segments: &[&str]) -> ConnectorResult<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ConnectorError::ConfigError(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                ConnectorError::ConfigError(format!(
                    "Base URL cannot have a path: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Starts an authenticated request against `path`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorize(self.client.request(method, self.build_url(path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::BearerToken { token } => {
                request.header("Authorization", format!("Bearer {}", token))
            }
        }
    }

    /// Executes a GET request with retry logic.
    pub async fn get(&self, path: &str) -> ConnectorResult<Response> {
        self.execute_with_retry(self.request(Method::GET, path)).await
    }

    /// Executes a GET request and deserializes the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ConnectorResult<T> {
        let response = self.get(path).await?;
        parse_json_response(response).await
    }

    /// GETs the percent-encoded `segments` path and deserializes the JSON response.
    pub async fn get_segments_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> ConnectorResult<T> {
        let url = self.segment_url(segments)?;
        let response = self
            .execute_with_retry(self.authorize(self.client.get(url)))
            .await?;
        parse_json_response(response).await
    }

    /// Executes a POST request with retry logic.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ConnectorResult<Response> {
        self.execute_with_retry(self.request(Method::POST, path).json(body))
            .await
    }

    /// Executes a POST request and deserializes the JSON response.
    pub async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> ConnectorResult<R> {
        let response = self.post(path, body).await?;
        parse_json_response(response).await
    }

    /// Sends a prepared request once and deserializes the JSON response.
    ///
    /// Used for calls that must not be repeated, such as transactions.
    pub async fn send_once_json<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ConnectorResult<R> {
        let response = self.execute_once(request).await?;
        parse_json_response(response).await
    }

    /// Executes a request once with error handling.
    async fn execute_once(&self, request: RequestBuilder) -> ConnectorResult<Response> {
        let response = request.send().await.map_err(map_transport_error)?;
        check_status(response).await
    }

    /// Executes a request with retries on transport and server errors.
    async fn execute_with_retry(&self, request: RequestBuilder) -> ConnectorResult<Response> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(100);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!(connector = %self.config.name, "Retry attempt {} after {:?}", attempt, delay);
                sleep(delay).await;
                delay = std::cmp::min(delay * 2 + rand_jitter(), Duration::from_secs(30));
            }

            let request_clone = request
                .try_clone()
                .ok_or_else(|| ConnectorError::Internal("Failed to clone request".to_string()))?;

            match request_clone.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = retry_after_secs(&response);
                        warn!(connector = %self.config.name, "Rate limited, waiting {} seconds", retry_after);
                        if attempt < self.config.max_retries {
                            sleep(Duration::from_secs(retry_after)).await;
                            continue;
                        }
                        return Err(ConnectorError::RateLimited(retry_after));
                    }

                    if status.is_server_error() && attempt < self.config.max_retries {
                        warn!(connector = %self.config.name, "Server error {}, retrying...", status);
                        last_error = Some(ConnectorError::RequestFailed(format!(
                            "Server error: {}",
                            status
                        )));
                        continue;
                    }

                    return check_status(response).await;
                }
                Err(e) => {
                    last_error = Some(map_transport_error(e));
                    if attempt >= self.config.max_retries {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ConnectorError::Internal("Unknown error".to_string())))
    }
}

fn map_transport_error(e: reqwest::Error) -> ConnectorError {
    if e.is_timeout() {
        ConnectorError::Timeout(e.to_string())
    } else if e.is_connect() {
        ConnectorError::ConnectionFailed(e.to_string())
    } else {
        ConnectorError::RequestFailed(e.to_string())
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

/// Extracts a human-readable message from an error body.
///
/// JSON bodies with a `message` or `error` field yield that field; anything
/// else is returned truncated.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(500).collect())
}

/// Maps error statuses onto connector errors.
async fn check_status(response: Response) -> ConnectorResult<Response> {
    let status = response.status();
    if status.is_success() || status.is_redirection() || status.is_informational() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ConnectorError::RateLimited(retry_after_secs(&response)));
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);

    Err(match status {
        StatusCode::UNAUTHORIZED => ConnectorError::AuthenticationFailed(message),
        StatusCode::FORBIDDEN => ConnectorError::AuthorizationDenied(message),
        StatusCode::NOT_FOUND => ConnectorError::NotFound(message),
        StatusCode::BAD_REQUEST => ConnectorError::InvalidRequest(message),
        StatusCode::CONFLICT => ConnectorError::Conflict(message),
        StatusCode::UNPROCESSABLE_ENTITY => ConnectorError::Unprocessable(message),
        s if s.is_server_error() => {
            ConnectorError::RequestFailed(format!("Server error: {}: {}", s, message))
        }
        s => ConnectorError::RequestFailed(format!("Client error: {}: {}", s, message)),
    })
}

/// Parses a JSON response.
async fn parse_json_response<T: DeserializeOwned>(response: Response) -> ConnectorResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))?;

    serde_json::from_str(&text).map_err(|e| {
        ConnectorError::InvalidResponse(format!(
            "Failed to parse response (status {}): {} - Body: {}",
            status,
            e,
            text.chars().take(500).collect::<String>()
        ))
    })
}

/// Small random jitter for exponential backoff.
fn rand_jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..100))
}
