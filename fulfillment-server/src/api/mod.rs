//! API routing module
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`orders`] - checkout, transitions, order queries
//! - [`shipments`] - rider-facing shipment operations
//! - [`riders`] - rider registration and availability
//! - [`variants`] - variant seeding and stock queries
//!
//! Actor identity arrives through explicit `X-Actor-Id`/`X-Actor-Role`
//! headers supplied by the surrounding application, which owns real
//! authentication; the engine only enforces authorization.

pub mod actor;
pub mod convert;

pub mod health;
pub mod orders;
pub mod riders;
pub mod shipments;
pub mod variants;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(shipments::router())
        .merge(riders::router())
        .merge(variants::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
