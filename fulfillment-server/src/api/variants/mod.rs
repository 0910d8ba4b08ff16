//! Variant API Module
//!
//! Stock seeding and visibility. The catalog itself lives in the
//! surrounding application; the engine only tracks the ledger fields.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Variant router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/variants", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
}
