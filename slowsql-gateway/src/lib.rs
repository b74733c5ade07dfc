//! Slow-SQL analysis gateway.
//!
//! Accepts batches of database connection descriptors over HTTP, persists
//! each batch to a timestamped file and hands that file to an external
//! analyzer script, relaying its JSON verdict in a uniform envelope.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod outcome;
pub mod persist;
pub mod validate;

use std::sync::Arc;

use axum::{routing::any, Router};
use tower_http::trace::TraceLayer;

use crate::{analyzer::Analyzer, config::GatewayConfig};

/// Shared state injected into every Axum handler via `State`.
pub struct AppState {
    pub config: GatewayConfig,
    pub analyzer: Arc<dyn Analyzer>,
}

/// Build the HTTP router. Both routes accept any method; `/processlist`
/// rejects non-POST requests inside its envelope.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", any(handlers::health))
        .route("/processlist", any(handlers::processlist))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
