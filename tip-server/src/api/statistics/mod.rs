//! Statistics API Module

mod handler;

pub use handler::parse_waiter_ids;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/restaurants/{rid}/statistics", get(handler::snapshot))
        .route("/api/statistics/compare", get(handler::compare))
}
