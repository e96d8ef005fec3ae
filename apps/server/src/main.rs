//! # bazaar-server: HTTP Application for Bazaar
//!
//! Thin orchestration layer over the workspace crates:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         bazaar-server                                   │
//! │                                                                         │
//! │  main()                                                                 │
//! │    ├── tracing-subscriber (EnvFilter, RUST_LOG)                        │
//! │    ├── SettleConfig::load (TOML)                                       │
//! │    ├── Database::new (migrations run here)                             │
//! │    ├── RateSynchronizer::spawn (background, 50-min default period)     │
//! │    ├── PaymentEventProcessor (shared via AppState)                     │
//! │    └── axum::serve (graceful shutdown on ctrl-c)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration file location: `$BAZAAR_CONFIG` if set, otherwise the
//! platform default (see [`bazaar_settle::SettleConfig::default_path`]).

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bazaar_db::{Database, DbConfig};
use bazaar_settle::{
    HttpRateProvider, PaymentEventProcessor, PaymentGateway, RateSynchronizer, SettleConfig,
};

mod error;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured logging; RUST_LOG overrides, info by default
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configuration
    let config = match std::env::var("BAZAAR_CONFIG") {
        Ok(path) => SettleConfig::load(path)?,
        Err(_) => SettleConfig::load_default()?,
    };

    if let Err(e) = config.validate() {
        error!(error = %e, "Configuration invalid");
        return Err(e.into());
    }

    // Database (runs embedded migrations)
    let db = Database::new(DbConfig::new(&config.database.path)).await?;

    // Rate synchronizer: recurring background refresh of the Rate Store
    let provider = HttpRateProvider::new(&config.provider)?;
    let sync_handle =
        RateSynchronizer::new(db.clone(), Arc::new(provider), config.refresh_interval()).spawn();

    // Settlement state machine
    let gateway = PaymentGateway::new(config.gateway.signing_secret.clone());
    let processor = Arc::new(PaymentEventProcessor::new(db.clone(), gateway));

    // HTTP server
    let app = routes::router(AppState::new(db.clone(), processor));
    let bind_address = config.server.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;

    info!(address = %bind_address, "bazaar-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Orderly teardown: stop the synchronizer, then the pool
    sync_handle.shutdown().await;
    db.close().await;

    info!("bazaar-server stopped");
    Ok(())
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install ctrl-c handler");
    }
    info!("Shutdown signal received");
}
