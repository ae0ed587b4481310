//! Health check endpoints.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::time::Instant;

use aw_connectors::ConnectorHealth;

use crate::dto::{HealthResponse, TextGenerationHealth};
use crate::state::AppState;

use super::info::ledger_info;

/// Start time for uptime calculation.
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time.
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/live", get(liveness_check))
}

/// Health check endpoint.
///
/// Always answers 200. A ledger that is not ready or an unhealthy text
/// generator reports `degraded`.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ledger = ledger_info(&state).await;
    let uptime = START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0);

    let mut generator_down = false;
    let text_generation = match &state.text_generator {
        Some(generator) => {
            let health = generator.health_check().await;
            generator_down = matches!(health, ConnectorHealth::Unhealthy(_));
            Some(text_generation_health(generator.model(), &health))
        }
        None => None,
    };

    let status = if ledger.ready && !generator_down {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        ledger,
        text_generation,
    })
}

fn text_generation_health(model: &str, health: &ConnectorHealth) -> TextGenerationHealth {
    TextGenerationHealth {
        model: model.to_string(),
        status: health.label().to_string(),
        message: health.message().map(str::to_string),
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    responses(
        (status = 200, description = "Process is alive")
    ),
    tag = "Health"
)]
pub async fn liveness_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}
