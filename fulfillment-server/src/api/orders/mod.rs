//! Order API Module
//!
//! Checkout, lifecycle transitions and order queries. All mutations go
//! through the FulfillmentManager command pipeline.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Checkout
        .route("/checkout", post(handler::checkout))
        // Open orders (optionally filtered by party)
        .route("/", get(handler::list_open))
        // Order detail
        .route("/{id}", get(handler::get_by_id))
        // Event stream (audit)
        .route("/{id}/events", get(handler::get_events))
        // Lifecycle transitions (seller/buyer events)
        .route("/{id}/transitions", post(handler::transition))
}
