//! REST API for the CIDR registry
//!
//! # Endpoints
//!
//! ## Records
//! - `GET /` or `GET /api/v1/cidrs` - List all records
//! - `GET /next`, `GET /?action=next` or `GET /api/v1/cidrs/next` - Next free /16
//! - `POST /` or `POST /api/v1/cidrs` - Register `{"key", "cidr"}`
//! - `DELETE /?key=NAME` or `DELETE /api/v1/cidrs/:key` - Release a key
//!   (`DELETE /api/v1/cidrs/next` releases the key `next`)
//!
//! ## Health
//! - `GET /health` - Health check
//! - `GET /ready` - Readiness check (scans the record store)

pub mod dto;
pub mod handlers;
pub mod router;
pub mod state;

pub use dto::*;
pub use router::create_router;
pub use state::AppState;

use crate::config::ServerConfig;
use std::sync::Arc;

/// Start the API server
///
/// # Example
///
/// ```ignore
/// use cidr_registry::api::{start_server, AppState};
/// use cidr_registry::config::ServerConfig;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let state = Arc::new(AppState::in_memory());
///     start_server(state, &ServerConfig::default()).await.unwrap();
/// }
/// ```
pub async fn start_server(state: Arc<AppState>, config: &ServerConfig) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr()).await?;

    tracing::info!("Starting API server on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
