mod domain;
mod clients;

mod app_system;
mod http;

#[cfg(test)]
mod mock_framework;

mod actor_framework;
mod catalog;
mod error;
mod keyed_lock;
mod ledger;
mod notify;
mod retry;
mod user_actor;
mod product_actor;
mod order_actor;

use std::sync::Arc;
use tracing::{error, info};
use crate::app_system::{setup_tracing, AppConfig, OrderSystem};
use crate::http::{app_router, AppState};
use crate::notify::LogNotifier;

#[tokio::main]
async fn main() -> Result<(), String> {
    // A missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env().map_err(|e| e.to_string())?;

    // Setup tracing once for the entire application
    setup_tracing(config.log_format);
    info!(environment = config.environment.as_str(), bind_addr = %config.bind_addr, "Starting storefront order service");

    // Create the entire order system (starts all actors)
    let system = OrderSystem::new(config.actor_buffer, Arc::new(LogNotifier));
    let app = app_router(AppState::new(&system, &config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {}", config.bind_addr, e))?;
    info!(bind_addr = %config.bind_addr, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await;
    if let Err(e) = served {
        error!(error = %e, "Server error");
    }

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
