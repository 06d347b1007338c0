mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;

use cli::{Cli, Commands};
use rb_core::config::Config;
use rb_db::pool::init_pool;
use rb_server::{build_router, scanner, AppContext};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

fn open_pool(config: &Config) -> Result<rb_db::pool::DbPool> {
    if let Some(parent) = config.server.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let db_path = config.server.db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path);
    init_pool(&db_path).context("initializing database pool")
}

fn load_config(path: Option<&Path>) -> Config {
    let config = Config::load_or_default(path);
    for warning in config.validate() {
        tracing::warn!("Config: {warning}");
    }
    config
}

async fn serve(host: String, port: u16, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path);
    config.server.host = host;
    config.server.port = port;

    let pool = open_pool(&config)?;
    let static_dir = config.server.static_dir.clone();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let ctx = AppContext::new(pool, Arc::new(config));
    let app = build_router(ctx, static_dir);

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn scan(
    root: &Path,
    reclassify: bool,
    backfill_hashes: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path);
    let pool = open_pool(&config)?;
    let ctx = AppContext::new(pool, Arc::new(config));

    let options = scanner::ScanOptions {
        reclassify,
        backfill_hashes,
    };
    let report = scanner::reconcile(&ctx, root, &options).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate(path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(path);
    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration OK");
    } else {
        for warning in &warnings {
            println!("warning: {warning}");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { host, port } => serve(host, port, cli.config.as_deref()).await,
        Commands::Scan {
            root,
            reclassify,
            backfill_hashes,
        } => scan(&root, reclassify, backfill_hashes, cli.config.as_deref()).await,
        Commands::Validate { config } => validate(config.or(cli.config).as_deref()),
        Commands::Version => {
            println!("reelbase {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
