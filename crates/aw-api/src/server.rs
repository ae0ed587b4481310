//! API server implementation.

use axum::{middleware, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{time::Duration as CookieDuration, SameSite};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::SESSION_COOKIE_NAME;
use crate::dto::*;
use crate::error::ErrorResponse;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::routes;
use crate::state::AppState;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind to.
    pub bind_address: SocketAddr,
    /// Serve Swagger UI at `/swagger-ui`.
    pub enable_swagger: bool,
    /// Mark the session cookie `Secure` (HTTPS only).
    pub session_secure: bool,
    /// Sessions expire after this many hours without a request.
    pub session_expiry_hours: i64,
    /// Largest accepted request body.
    pub body_limit_bytes: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            enable_swagger: true,
            session_secure: false,
            session_expiry_hours: 24,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::info::api_info,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::session_info,
        crate::routes::batches::create_batch,
        crate::routes::batches::list_batches,
        crate::routes::batches::get_batch,
        crate::routes::batches::approve_batch,
        crate::routes::batches::reject_batch,
        crate::routes::batches::certify_batch,
        crate::routes::submissions::create_submission,
        crate::routes::submissions::list_submissions,
        crate::routes::submissions::get_submission,
        crate::routes::submissions::search_submissions,
        crate::routes::submissions::update_submission,
        crate::routes::submissions::delete_submission,
        crate::routes::export::export_csv,
        crate::routes::export::export_xlsx,
        crate::routes::wallets::my_balance,
        crate::routes::wallets::user_balance,
        crate::routes::predict::predict,
        crate::routes::health::health_check,
        crate::routes::health::liveness_check,
        crate::routes::metrics::prometheus_metrics,
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            UserInfo,
            SessionResponse,
            SuccessResponse,
            CreateBatchResponse,
            BatchListResponse,
            BatchResponse,
            TransactionResponse,
            RejectRequest,
            CertifyRequest,
            SubmissionSavedResponse,
            SubmissionListResponse,
            SubmissionResponse,
            WalletBalanceResponse,
            ChatMessage,
            PredictRequest,
            PredictChoice,
            PredictResponse,
            FeatureInfo,
            LedgerInfo,
            InfoResponse,
            TextGenerationHealth,
            HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration and sessions"),
        (name = "Batches", description = "Batch recording and review lifecycle"),
        (name = "Submissions", description = "Spreadsheet-backed material submissions"),
        (name = "Wallets", description = "Per-user token balances"),
        (name = "AI", description = "Text generation proxy"),
        (name = "Info", description = "Service information"),
        (name = "Health", description = "Health check endpoints"),
        (name = "Metrics", description = "System metrics"),
    ),
    info(
        title = "Aware API",
        version = "0.1.0",
        description = "Supply-chain material tracking: batches, submissions and wallets",
        license(name = "MIT"),
    )
)]
pub struct ApiDoc;

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Creates a new API server.
    pub fn new(state: AppState, config: ApiServerConfig) -> Self {
        Self { config, state }
    }

    /// Creates a new API server with default configuration.
    pub fn with_state(state: AppState) -> Self {
        Self::new(state, ApiServerConfig::default())
    }

    /// Builds the session layer backed by an in-process store.
    fn session_layer(&self) -> SessionManagerLayer<MemoryStore> {
        SessionManagerLayer::new(MemoryStore::default())
            .with_name(SESSION_COOKIE_NAME)
            .with_secure(self.config.session_secure)
            .with_same_site(SameSite::Lax)
            .with_expiry(Expiry::OnInactivity(CookieDuration::hours(
                self.config.session_expiry_hours,
            )))
    }

    /// Builds the router.
    pub fn router(&self) -> Router {
        routes::health::init_start_time();

        let mut app = routes::create_router(self.state.clone());

        if self.config.enable_swagger {
            app = app.merge(
                SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
            );
        }

        // Innermost first.
        app.layer(middleware::from_fn(security_headers))
            .layer(middleware::from_fn(request_logging))
            .layer(middleware::from_fn(request_id))
            .layer(self.session_layer())
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer())
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes))
            .layer(CatchPanicLayer::new())
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<(), std::io::Error> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs the server with a custom shutdown signal.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = self.config.bind_address;

        info!("Starting API server on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server shut down gracefully");
        Ok(())
    }
}

/// Default shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestContext;

    #[tokio::test]
    async fn test_router_creation() {
        let ctx = TestContext::new().await;
        let server = ApiServer::with_state(ctx.state.clone());
        let _router = server.router();
    }

    #[test]
    fn test_openapi_lists_batch_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/batches/{id}/approve"));
        assert!(doc.paths.paths.contains_key("/api/submissions/search"));
    }
}
