//! HTTP API and status page
//!
//! # Endpoints
//!
//! - `GET /` - HTML status table
//! - `GET /healthz` - Liveness and version
//! - `GET /metrics` - Prometheus text exposition
//! - `GET /targets`, `POST /targets` - List and create targets
//! - `DELETE /targets/{id}` - Delete a target (its history is kept)
//! - `GET /targets/{id}/checks?limit=N` - Recent check history

pub mod api;
pub mod status;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::metrics::MonitorMetrics;
use crate::storage::SharedTargetStore;

pub use api::create_router;
pub use status::StatusPage;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Target store
    pub store: SharedTargetStore,

    /// Metrics registry
    pub metrics: Arc<MonitorMetrics>,

    /// Status page renderer
    pub status_page: Arc<StatusPage>,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(
        store: SharedTargetStore,
        metrics: Arc<MonitorMetrics>,
        config: ServerConfig,
    ) -> Result<Self, ServerError> {
        let status_page = StatusPage::new().map_err(ServerError::Init)?;

        Ok(Self {
            store,
            metrics,
            status_page: Arc::new(status_page),
            start_time: Instant::now(),
            config,
        })
    }
}

// ============================================================================
// Server
// ============================================================================

/// Build the router with all routes and configured layers
pub fn build_router(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;
    let enable_request_logging = state.config.enable_request_logging;
    let mut router = create_router(state);

    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    if enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Serve the API until `shutdown_signal` resolves
pub async fn serve_with_shutdown(
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = state.config.bind_address;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("API server shutdown complete");
    Ok(())
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),

    /// Failed to bind to address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Server error
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
