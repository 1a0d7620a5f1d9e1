//! WebSocket server command handler
//!
//! Opens the record database, binds the listener and serves plate checks
//! until Ctrl-C. Shutdown closes every open session before returning.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::cli::ServeArgs;
use crate::config::SmartplateConfig;
use crate::error::{Result, SmartplateError};
use crate::plate_check::PlateCheckService;
use crate::socket_server::serve;

use super::open_store;

/// Run the plate check server
pub fn run_serve(args: &ServeArgs, mut config: SmartplateConfig) -> Result<String> {
    args.apply(&mut config);
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| SmartplateError::ServerError {
        message: format!("Failed to create tokio runtime: {}", e),
    })?;

    runtime.block_on(async { run_serve_async(&config).await })
}

async fn run_serve_async(config: &SmartplateConfig) -> Result<String> {
    let store = open_store(config)?;
    tracing::info!(
        "Starting smartplate v{} with database {}",
        env!("CARGO_PKG_VERSION"),
        store.db_path().display()
    );

    let service = Arc::new(PlateCheckService::for_store(
        Arc::new(store),
        config.lookup.timeout(),
    ));

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SmartplateError::ServerError {
            message: format!("Failed to bind {}: {}", addr, e),
        })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl-C, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                // Keep the sender alive so the server runs until killed.
                std::future::pending::<()>().await;
            }
        }
    });

    let stats = serve(listener, service, &config.server.path, shutdown_rx).await;

    Ok(format!(
        "Served {} connection(s), {} frame(s)\n",
        stats.connections, stats.frames_handled
    ))
}
