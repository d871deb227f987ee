//! API routes
//!
//! - [`health`] - health check
//! - [`roles`] - tip-share roles and budget
//! - [`employees`] - employee directory
//! - [`payments`] - ledger writes and transfer validation
//! - [`statistics`] - snapshots and comparison

pub mod employees;
pub mod health;
pub mod payments;
pub mod roles;
pub mod statistics;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(roles::router())
        .merge(employees::router())
        .merge(payments::router())
        .merge(statistics::router())
}

/// Build the fully configured application
pub fn build_app(config: &Config) -> Router<ServerState> {
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Request timeout
        .layer(TimeoutLayer::new(config.request_timeout()))
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
}
