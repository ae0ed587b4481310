//! Aware CLI
//!
//! Command-line interface for the Aware material-tracking platform.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod api_client;
mod commands;
mod config;
mod validator;

use api_client::{ApiClient, ListBatchesParams};
use aw_core::Batch;
use commands::{run_server, ServeConfig};
use config::AppConfig;
use validator::ConfigValidator;

#[derive(Parser)]
#[command(name = "aware")]
#[command(version)]
#[command(about = "Supply-chain material tracking: batches, submissions and wallets", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "AWARE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// API server URL (for remote commands)
    #[arg(long, default_value = "http://localhost:3000", env = "AWARE_API_URL")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Spreadsheet file (overrides storage.spreadsheet_path)
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Disable Swagger UI
        #[arg(long)]
        no_swagger: bool,

        /// Validate configuration and exit without starting the server
        #[arg(long)]
        validate_only: bool,
    },

    /// Validate configuration
    Validate,

    /// Show current configuration
    Config {
        /// Show secrets (redacted by default)
        #[arg(long)]
        show_secrets: bool,
    },

    /// Show the status of a running server
    Status,

    /// Inspect batches on a running server
    Batch {
        #[command(subcommand)]
        action: BatchCommands,
    },

    /// Download the submissions CSV from a running server
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BatchCommands {
    /// List batches
    List {
        /// Filter by status (code or label)
        #[arg(short, long)]
        status: Option<String>,

        /// Search asset id, material, batch number, supplier or country
        #[arg(long)]
        search: Option<String>,

        /// Sort order (newest, oldest, status, assetId)
        #[arg(long)]
        sort: Option<String>,
    },

    /// Show batch details
    Show {
        /// Batch ID
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = AppConfig::load(&config_path).unwrap_or_else(|_| {
        if cli.verbose {
            eprintln!("Using default configuration (no config file found)");
        }
        AppConfig::default()
    });

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if cli.format == OutputFormat::Json {
        logging.json = true;
    }
    // A subscriber may already be installed when embedded; keep going.
    let _ = aw_observability::init_logging_with_config(&logging);

    match cli.command {
        Commands::Serve {
            port,
            host,
            data,
            no_swagger,
            validate_only,
        } => {
            let mut serve_config = ServeConfig::from_app_config(&config);
            if let Some(port) = port {
                serve_config.port = port;
            }
            if let Some(host) = host {
                serve_config.host = host;
            }
            if let Some(data) = data {
                serve_config.spreadsheet_path = data;
            }
            if no_swagger {
                serve_config.enable_swagger = false;
            }
            cmd_serve(serve_config, config, validate_only).await
        }
        Commands::Validate => cmd_validate(config_path).await,
        Commands::Config { show_secrets } => cmd_config(config, show_secrets, cli.format),
        Commands::Status => cmd_status(cli.format, &cli.api_url).await,
        Commands::Batch { action } => cmd_batch(action, cli.format, &cli.api_url).await,
        Commands::Export { output } => cmd_export(&cli.api_url, output).await,
    }
}

fn default_config_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("io", "aware", "aware") {
        dirs.config_dir().join("config.yaml")
    } else {
        PathBuf::from("config/default.yaml")
    }
}

async fn cmd_serve(serve_config: ServeConfig, app_config: AppConfig, validate_only: bool) -> Result<()> {
    println!("{}", "Validating configuration...".cyan());

    let validation_result = ConfigValidator::validate(&app_config);
    validation_result.print();

    if validation_result.has_errors() {
        println!();
        println!(
            "{}",
            "Server startup aborted due to configuration errors. Fix the errors above and try again."
                .red()
                .bold()
        );
        std::process::exit(1);
    }

    if validate_only {
        println!();
        println!(
            "{}",
            "Configuration is valid. Server can be started."
                .green()
                .bold()
        );
        return Ok(());
    }

    println!();
    run_server(serve_config, app_config).await
}

async fn cmd_validate(config_path: PathBuf) -> Result<()> {
    println!(
        "Validating configuration: {}",
        config_path.display().to_string().cyan()
    );

    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("{}: {:#}", "Configuration file error".red().bold(), e);
            std::process::exit(1);
        }
    };

    let validation_result = ConfigValidator::validate(&config);
    validation_result.print();

    println!();
    println!("{}", "Configuration Summary".bold());
    println!("─────────────────────");
    println!("  Bind: {}:{}", config.server.host, config.server.port);
    println!("  Spreadsheet: {}", config.storage.spreadsheet_path.display());
    println!("  Ledger: {}", config.ledger.backend);
    if config.text_generation.enabled {
        println!(
            "  Text generation: {} at {}",
            config.text_generation.model, config.text_generation.base_url
        );
    } else {
        println!("  Text generation: disabled");
    }

    if validation_result.has_errors() {
        println!();
        println!(
            "{}",
            "Configuration validation failed. Fix the errors above."
                .red()
                .bold()
        );
        std::process::exit(1);
    } else if validation_result.has_warnings() {
        println!();
        println!(
            "{}",
            "Configuration is valid with warnings. Review the warnings above."
                .yellow()
                .bold()
        );
    } else {
        println!();
        println!("{}", "Configuration is valid.".green().bold());
    }

    Ok(())
}

fn cmd_config(config: AppConfig, show_secrets: bool, format: OutputFormat) -> Result<()> {
    let display_config = if show_secrets {
        config
    } else {
        config.redact_secrets()
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&display_config)?);
    } else {
        println!("{}", "Current Configuration".bold());
        println!("─────────────────────────");
        print!("{}", serde_yaml::to_string(&display_config)?);
    }

    Ok(())
}

async fn cmd_status(format: OutputFormat, api_url: &str) -> Result<()> {
    let client = ApiClient::new(api_url)?;

    match client.health().await {
        Ok(health) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                let status = if health.status == "healthy" {
                    health.status.green()
                } else {
                    health.status.yellow()
                };
                println!("{}", "Aware Status".bold());
                println!("─────────────────────");
                println!("Status: {}", status);
                println!("Version: {}", health.version);
                println!("Uptime: {}s", health.uptime_seconds);
                println!(
                    "Ledger: {} ({})",
                    health.ledger.backend,
                    if health.ledger.ready {
                        "ready".green()
                    } else {
                        "not ready".red()
                    }
                );
                if let Some(address) = &health.ledger.contract_address {
                    println!("Contract: {}", address);
                }
                if let Some(generator) = &health.text_generation {
                    let state = if generator.status == "healthy" {
                        generator.status.green()
                    } else {
                        generator.status.red()
                    };
                    match &generator.message {
                        Some(message) => {
                            println!("Text generation: {} {} ({})", generator.model, state, message)
                        }
                        None => println!("Text generation: {} {}", generator.model, state),
                    }
                }
            }
        }
        Err(e) => {
            println!("{}: {:#}", "Error".red(), e);
            println!("Make sure the API server is running (aware serve)");
        }
    }
    Ok(())
}

fn print_batch_line(batch: &Batch) {
    let status = batch.status.label();
    let status = match batch.status.code() {
        0 => status.yellow(),
        1 => status.green(),
        2 => status.red(),
        _ => status.cyan(),
    };
    println!(
        "  {:>4} [{}] {} - {} ({} kg) by {}",
        batch.id.to_string().cyan(),
        status,
        batch.physical_asset.asset_id,
        batch.physical_asset.material,
        batch.physical_asset.weight,
        batch.created_by_name
    );
}

async fn cmd_batch(action: BatchCommands, format: OutputFormat, api_url: &str) -> Result<()> {
    let client = ApiClient::new(api_url)?;

    match action {
        BatchCommands::List {
            status,
            search,
            sort,
        } => {
            let params = ListBatchesParams {
                status,
                search,
                sort,
            };
            match client.list_batches(&params).await {
                Ok(response) => {
                    if format == OutputFormat::Json {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        println!("{}", "Batches".bold());
                        println!("───────");
                        if response.batches.is_empty() {
                            println!("No batches found");
                        } else {
                            for batch in &response.batches {
                                print_batch_line(batch);
                            }
                            println!();
                            println!("{} total", response.count);
                        }
                    }
                }
                Err(e) => {
                    println!("{}: {:#}", "Error".red(), e);
                    println!("Make sure the API server is running (aware serve)");
                }
            }
        }
        BatchCommands::Show { id } => match client.get_batch(id).await {
            Ok(response) => {
                let batch = response.batch;
                if format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&batch)?);
                } else {
                    println!("{} {}", "Batch:".bold(), batch.id);
                    println!("─────────────────────────────────────────");
                    println!("  {} {}", "Status:".cyan(), batch.status);
                    println!("  {} {}", "Asset:".cyan(), batch.physical_asset.asset_id);
                    println!("  {} {}", "Material:".cyan(), batch.physical_asset.material);
                    println!("  {} {}", "Weight:".cyan(), batch.physical_asset.weight);
                    println!("  {} {}", "Supplier:".cyan(), batch.tracer.supplier);
                    println!("  {} {}", "Country:".cyan(), batch.tracer.country);
                    println!(
                        "  {} {} ({})",
                        "Created by:".cyan(),
                        batch.created_by_name,
                        batch.created_by_role
                    );
                    if !batch.approved_by_name.is_empty() {
                        println!("  {} {}", "Reviewed by:".cyan(), batch.approved_by_name);
                    }
                    if !batch.rejection_reason.is_empty() {
                        println!("  {} {}", "Rejection:".cyan(), batch.rejection_reason);
                    }
                    if !batch.certified_by_name.is_empty() {
                        println!(
                            "  {} {} ({})",
                            "Certified by:".cyan(),
                            batch.certified_by_name,
                            batch.certification_hash
                        );
                    }
                }
            }
            Err(e) => {
                println!("{}: {:#}", "Error".red(), e);
            }
        },
    }
    Ok(())
}

async fn cmd_export(api_url: &str, output: Option<PathBuf>) -> Result<()> {
    let client = ApiClient::new(api_url)?;
    let csv = client.export_csv().await?;

    match output {
        Some(path) => {
            std::fs::write(&path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Wrote {}", "✓".green(), path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}
