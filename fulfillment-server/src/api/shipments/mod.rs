//! Shipment API Module
//!
//! Rider-facing delivery operations and backlog visibility.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Shipment router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/shipments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Assignment backlog (unassigned shipments)
        .route("/backlog", get(handler::backlog))
        // Shipment detail
        .route("/{id}", get(handler::get_by_id))
        // Rider progress updates
        .route("/{id}/progress", post(handler::progress))
        .route("/{id}/delivered", post(handler::delivered))
        .route("/{id}/failed", post(handler::failed))
}
