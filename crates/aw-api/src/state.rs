//! Application state shared across handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use aw_connectors::TextGenerator;
use aw_core::{BatchLedger, LedgerError, SpreadsheetStorage, WalletRegistry};
use aw_observability::MetricsCollector;

use crate::error::ApiError;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Contract client for accounts and batches.
    pub ledger: Arc<dyn BatchLedger>,
    /// Per-user server wallets.
    pub wallets: WalletRegistry,
    /// Spreadsheet store for free-form submissions.
    pub submissions: Arc<SpreadsheetStorage>,
    /// Backend of the AI proxy, if configured.
    pub text_generator: Option<Arc<dyn TextGenerator>>,
    pub metrics: MetricsCollector,
    /// Prometheus handle for rendering `/metrics`.
    pub prometheus_handle: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn BatchLedger>,
        wallets: WalletRegistry,
        submissions: Arc<SpreadsheetStorage>,
    ) -> Self {
        Self {
            ledger,
            wallets,
            submissions,
            text_generator: None,
            metrics: MetricsCollector::new(),
            prometheus_handle: None,
        }
    }

    /// Sets the text generator behind `/api/predict`.
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    /// Sets the Prometheus handle for metrics rendering.
    pub fn with_prometheus_handle(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus_handle = Some(Arc::new(handle));
        self
    }

    /// Returns the ledger, or 503 when it is not ready for calls.
    pub async fn ready_ledger(&self) -> Result<&dyn BatchLedger, ApiError> {
        if self.ledger.is_ready().await {
            Ok(self.ledger.as_ref())
        } else {
            Err(LedgerError::NotReady.into())
        }
    }
}
