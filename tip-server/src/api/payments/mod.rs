//! Payment API Module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/restaurants/{rid}/payments",
            get(handler::list).post(handler::append),
        )
        .nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::set_status))
        .route("/{id}/transfer-details", put(handler::attach_transfer_details))
        .route("/{id}/validate", post(handler::validate))
}
