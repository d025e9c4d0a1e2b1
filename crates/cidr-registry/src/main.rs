//! CIDR Registry server and CLI
//!
//! Usage:
//!   cidr-registry [serve]            # Run the HTTP API
//!   cidr-registry list               # List records
//!   cidr-registry next               # Next free /16
//!   cidr-registry register KEY CIDR  # Register a block
//!   cidr-registry delete KEY         # Release a key

mod cli;

use anyhow::{Context, Result};
use cidr_registry::api::{start_server, ListResponse, RecordDto};
use cidr_registry::{store, AppState, PostgresConfig, Registry, RegistryConfig, StoreConfig};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, OutputFormat, StoreBackend};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;

    info!(
        store = store_label(&config.store),
        pool = %format!("{}.x.0.0/16 ({} candidates)", config.pool.base_octet, config.pool.size),
        "Loaded configuration"
    );

    let record_store = store::connect(&config.store).await?;
    let registry = Registry::new(record_store, &config)?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let mut server = config.server.clone();
            if let Some(port) = port {
                server.port = port;
            }
            let state = Arc::new(AppState::new(registry));
            start_server(state, &server).await?;
        }
        Commands::List => {
            let records = registry.list().await?;
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&ListResponse::new(records))?)
                }
                OutputFormat::Plain => {
                    for record in records {
                        println!("{}\t{}", record.name, record.block);
                    }
                }
            }
        }
        Commands::Next => {
            let next = registry.next_available().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "cidr": next.to_string() })),
                OutputFormat::Plain => println!("{}", next),
            }
        }
        Commands::Register { key, cidr } => {
            let record = registry.register(&key, &cidr).await?;
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&RecordDto::from(record))?)
                }
                OutputFormat::Plain => println!("{}\t{}", record.name, record.block),
            }
        }
        Commands::Delete { key } => {
            registry.delete(&key).await?;
            if let OutputFormat::Json = cli.format {
                println!("{}", serde_json::json!({ "key": key, "deleted": true }));
            }
        }
    }

    Ok(())
}

/// Environment configuration with command-line overrides applied
fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let mut config = RegistryConfig::from_env()?;

    match cli.store {
        Some(StoreBackend::Memory) => config.store = StoreConfig::Memory,
        Some(StoreBackend::Postgres) if !matches!(config.store, StoreConfig::Postgres(_)) => {
            let url = std::env::var("DATABASE_URL")
                .context("--store postgres requires DATABASE_URL")?;
            config.store = StoreConfig::Postgres(PostgresConfig::new(url));
        }
        _ => {}
    }

    if let Some(timeout_ms) = cli.timeout_ms {
        config.operation_timeout_ms = timeout_ms;
    }

    config.validate()?;
    Ok(config)
}

fn store_label(store: &StoreConfig) -> &'static str {
    match store {
        StoreConfig::Memory => "memory",
        StoreConfig::Postgres(_) => "postgres",
    }
}
