//! Service information endpoint.

use axum::{extract::State, routing::get, Json, Router};

use crate::dto::{FeatureInfo, InfoResponse, LedgerInfo};
use crate::state::AppState;

/// Creates the info route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(api_info))
}

/// Describes the running service and its ledger connection.
pub(crate) async fn ledger_info(state: &AppState) -> LedgerInfo {
    LedgerInfo {
        ready: state.ledger.is_ready().await,
        backend: state.ledger.backend_name().to_string(),
        contract_address: state.ledger.contract_address(),
    }
}

/// Service banner with enabled features.
#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "Service information", body = InfoResponse)
    ),
    tag = "Info"
)]
pub async fn api_info(State(state): State<AppState>) -> Json<InfoResponse> {
    let ledger = ledger_info(&state).await;

    Json(InfoResponse {
        message: "Aware Material Tracking Platform API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        features: FeatureInfo {
            ledger: ledger.ready,
            text_generation: state.text_generator.is_some(),
            authentication: true,
        },
        ledger,
    })
}
