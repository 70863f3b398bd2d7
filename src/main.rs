use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vora::{
    catalog::CatalogClient,
    checkout::CheckoutClient,
    config::Config,
    session::{AppState, Profile, SessionServer},
    storage::{SqliteStorage, Storage},
};

/// Voice-driven empathic commerce session bridge.
#[derive(Debug, Parser)]
#[command(name = "vora", version, about)]
struct Args {
    /// Store profile to run the session against.
    #[arg(long, value_enum, default_value = "market")]
    profile: Profile,

    /// Override the SQLite database path from the environment.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = args.db_path {
        config.database.path = path;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        profile = ?args.profile,
        "Vora session bridge starting..."
    );

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize boundary clients
    let catalog = match CatalogClient::new(&config.catalog, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.catalog.base_url, "Catalog client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize catalog client");
            return Err(e.into());
        }
    };

    let payments = match CheckoutClient::new(&config.payments, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.payments.base_url, "Payment client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize payment client");
            return Err(e.into());
        }
    };

    // A dead catalog degrades to an empty storefront, it never blocks
    // the session from starting.
    let products = match catalog.fetch_products().await {
        Ok(products) => {
            info!(count = products.len(), "Catalog loaded");
            products
        }
        Err(e) => {
            warn!(error = %e, "Catalog fetch failed, starting with empty catalog");
            Vec::new()
        }
    };

    let snapshot_key = config.session.storage_key.clone();
    let snapshot = match storage.load_snapshot(&snapshot_key).await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, key = %snapshot_key, "Snapshot load failed, starting fresh");
            None
        }
    };

    // Create application state
    let state = Arc::new(AppState::new(config, storage, catalog, payments));

    // Start the session server
    let mut server = SessionServer::new(state, args.profile);
    if let Some(snapshot) = snapshot {
        info!(key = %snapshot_key, "Restoring persisted session snapshot");
        server.market_mut().restore(snapshot);
    }
    // A fresh catalog supersedes the snapshot's cached products; a failed
    // fetch keeps whatever the snapshot carried.
    if !products.is_empty() {
        server.market_mut().set_products(products);
    }

    info!("Session ready, waiting for transport events on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Session error");
        return Err(e.into());
    }

    info!("Session shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        vora::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        vora::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
