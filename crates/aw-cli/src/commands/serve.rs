//! Serve command - starts the API server.

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use aw_api::{ApiServer, ApiServerConfig, AppState};
use aw_connectors::{
    AuthConfig, ConnectorConfig, GatewayLedger, OllamaClient, OllamaConfig, TextGenerator,
};
use aw_core::{seed_demo_data, BatchLedger, InMemoryLedger, SpreadsheetStorage, WalletRegistry};
use aw_observability::install_prometheus_recorder;

use crate::config::{AppConfig, LedgerBackend};

/// Server settings after applying CLI overrides to the config file.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub spreadsheet_path: PathBuf,
    pub enable_swagger: bool,
}

impl ServeConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            spreadsheet_path: config.storage.spreadsheet_path.clone(),
            enable_swagger: config.server.swagger,
        }
    }
}

fn build_ledger(config: &AppConfig) -> Result<Arc<dyn BatchLedger>> {
    let ledger = &config.ledger;
    match ledger.backend {
        LedgerBackend::Memory => Ok(Arc::new(InMemoryLedger::new())),
        LedgerBackend::Gateway => {
            let mut connector = ConnectorConfig::new("ledger-gateway", &ledger.gateway_url);
            connector.timeout_secs = ledger.timeout_secs;
            connector.max_retries = ledger.max_retries;
            if let Some(token) = &ledger.gateway_api_key {
                connector.auth = AuthConfig::BearerToken {
                    token: token.clone(),
                };
            }
            let gateway =
                GatewayLedger::new(connector).context("Failed to create gateway ledger client")?;
            Ok(Arc::new(gateway))
        }
    }
}

fn build_text_generator(config: &AppConfig) -> Result<Option<Arc<dyn TextGenerator>>> {
    let generation = &config.text_generation;
    if !generation.enabled {
        return Ok(None);
    }

    let client = OllamaClient::new(OllamaConfig {
        base_url: generation.base_url.clone(),
        model: generation.model.clone(),
        timeout_secs: generation.timeout_secs,
    })
    .context("Failed to create text generation client")?;
    Ok(Some(Arc::new(client)))
}

/// Runs the API server.
pub async fn run_server(config: ServeConfig, app_config: AppConfig) -> Result<()> {
    println!("{} Starting Aware API Server...", "[server]".cyan());

    let prometheus = match install_prometheus_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed; /metrics disabled");
            None
        }
    };

    println!(
        "  {} Spreadsheet: {}",
        "→".green(),
        config.spreadsheet_path.display()
    );
    let storage = SpreadsheetStorage::new(config.spreadsheet_path.clone())
        .context("Failed to open spreadsheet storage")?;

    println!("  {} Ledger: {}", "→".green(), app_config.ledger.backend);
    let ledger = build_ledger(&app_config)?;
    let wallets = WalletRegistry::new();

    if !ledger.is_ready().await {
        warn!(
            backend = ledger.backend_name(),
            "Ledger not ready; ledger endpoints return 503 until it is"
        );
    } else if app_config.ledger.seed_demo_data {
        let summary = seed_demo_data(ledger.as_ref(), &wallets)
            .await
            .context("Failed to seed demo data")?;
        println!(
            "  {} Demo data: {} users, {} batches",
            "✓".green(),
            summary.users_registered,
            summary.batches_created
        );
    }

    let mut state = AppState::new(ledger, wallets, Arc::new(storage));
    if let Some(generator) = build_text_generator(&app_config)? {
        info!(model = generator.model(), "Text generation enabled");
        state = state.with_text_generator(generator);
    }
    if let Some(handle) = prometheus {
        state = state.with_prometheus_handle(handle);
    }

    let bind_address: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    let server_config = ApiServerConfig {
        bind_address,
        enable_swagger: config.enable_swagger,
        session_secure: app_config.server.session_secure,
        session_expiry_hours: app_config.server.session_expiry_hours,
        ..Default::default()
    };

    println!();
    println!("{}", "Aware API Server".bold());
    println!("{}", "═".repeat(40));
    println!("  {} http://{}", "Address:".cyan(), bind_address);
    println!("  {} {}", "Ledger:".cyan(), app_config.ledger.backend);

    if config.enable_swagger {
        println!(
            "  {} http://{}/swagger-ui",
            "Swagger UI:".cyan(),
            bind_address
        );
    }

    println!();
    println!("{}", "Endpoints:".bold());
    println!("  POST /api/auth/login               - Start a session");
    println!("  GET  /api/batches                  - List batches");
    println!("  POST /api/batches/create           - Record a batch");
    println!("  POST /api/batches/:id/approve      - Approve a batch");
    println!("  POST /api/submissions              - Save a submission");
    println!("  GET  /api/export/csv               - Export submissions");
    println!("  GET  /api/wallet/balance           - Token balances");
    println!("  POST /api/predict                  - Text generation");
    println!("  GET  /health                       - Health check");
    println!("  GET  /metrics                      - Prometheus metrics");
    println!();
    println!("Press {} to stop", "Ctrl+C".yellow());
    println!();

    let server = ApiServer::new(state, server_config);
    server.run().await.context("Server error")?;

    println!();
    println!("{} Server stopped", "[server]".cyan());

    Ok(())
}
