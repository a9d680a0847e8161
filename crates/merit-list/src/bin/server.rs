//! Merit list server binary
//!
//! Run with: cargo run -p merit-list --bin merit-list-server -- --config merit.toml

use clap::Parser;
use merit_list::{config::MeritConfig, server::MeritServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exam result ingestion and merit list server
#[derive(Debug, Parser)]
#[command(name = "merit-list-server", version, about)]
struct Cli {
    /// TOML configuration file (defaults to $MERIT_LIST_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merit_list=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => MeritConfig::from_file(path)?,
        None => MeritConfig::load()?,
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Database: {}", config.storage.database_path.display());
    tracing::info!("  - Uploads: {}", config.storage.upload_dir.display());
    tracing::info!(
        "  - Extract tool: {} {:?}",
        config.pipeline.extract.program,
        config.pipeline.extract.args
    );
    tracing::info!(
        "  - Normalize tool: {} {:?}",
        config.pipeline.normalize.program,
        config.pipeline.normalize.args
    );
    tracing::info!(
        "  - Unique merit list entries enforced: {}",
        config.matcher.enforce_unique_entries
    );

    let server = MeritServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
