//! API routes.

pub mod auth;
pub mod batches;
pub mod export;
pub mod health;
pub mod info;
pub mod metrics;
pub mod predict;
pub mod submissions;
pub mod wallets;

use crate::state::AppState;
use axum::Router;

/// Creates the main API router.
///
/// Session-backed handlers need the session layer that
/// [`ApiServer::router`](crate::ApiServer::router) installs.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .merge(health::routes())
        .merge(metrics::routes())
        .with_state(state)
}

/// Routes under the `/api` prefix.
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(info::routes())
        .nest("/auth", auth::routes())
        .nest("/batches", batches::routes())
        .nest("/submissions", submissions::routes())
        .nest("/export", export::routes())
        .merge(wallets::routes())
        .merge(predict::routes())
}
