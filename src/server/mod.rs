//! HTTP surface of the market data service.

pub mod auth;
pub mod error;
pub mod routes;

use crate::core::MarketDataService;
use anyhow::{Context, Result};
use auth::TokenVerifier;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MarketDataService>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(service: MarketDataService, verifier: TokenVerifier) -> Self {
        Self {
            service: Arc::new(service),
            verifier: Arc::new(verifier),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_router())
        .nest("/api/market", routes::market_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl-C.
pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
