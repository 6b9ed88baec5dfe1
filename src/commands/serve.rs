//! Run the tempdrop server.
//!
//! Starts the expiration reaper (first sweep immediately, then on the
//! configured interval) and serves the HTTP API until Ctrl-C.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::http::{self, AccessKey, AppState};
use crate::reaper::Reaper;
use crate::store::ObjectStore;

/// Serve uploads and downloads with the given configuration.
///
/// # Errors
///
/// Returns an error if the storage directory cannot be created, the port
/// cannot be bound, or the server fails.
pub async fn execute(config: Config) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting tempdrop");

    let store = ObjectStore::open(config.store_config())?;

    let access_key = match &config.access_key {
        Some(key) => AccessKey::new(key.clone()),
        None => {
            let key = AccessKey::generate();
            println!("Upload key: {}", key.expose());
            key
        },
    };

    let reaper = Reaper::new(store.dir(), config.reap_interval());
    info!(
        interval_min = config.cleanup_interval_min,
        "Cleanup timer configured"
    );
    let reaper_handle = reaper.spawn();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        %addr,
        site_url = %config.site_url,
        storage_dir = %store.dir().display(),
        max_file_size_mb = config.max_file_size_mb,
        max_total_files = config.max_total_files,
        "Server running"
    );

    let state = Arc::new(AppState { store, access_key });
    let result = http::serve(listener, state, shutdown_signal()).await;

    reaper_handle.abort();
    info!("Server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
