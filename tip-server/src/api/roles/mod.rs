//! Role API Module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/restaurants/{rid}/roles", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/budget", get(handler::budget))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/unassign", post(handler::unassign))
}
