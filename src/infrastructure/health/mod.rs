//! Liveness endpoint
//!
//! Answers `GET /` and `GET /health` so hosting platforms can see the process is up.
//! It never touches bot state.

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::application::errors::BotError;

const LIVE_MESSAGE: &str = "Bot is live!";

pub fn router() -> Router {
    Router::new()
        .route("/", get(live_handler))
        .route("/health", get(live_handler))
}

async fn live_handler() -> &'static str {
    LIVE_MESSAGE
}

/// Serve the liveness endpoint until the process exits
pub async fn serve(port: u16) -> Result<(), BotError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BotError::Network(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Liveness endpoint on http://{}", addr);
    axum::serve(listener, router())
        .await
        .map_err(|e| BotError::Network(e.to_string()))
}
