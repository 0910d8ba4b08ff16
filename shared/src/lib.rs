//! Shared types for the marketplace fulfillment engine
//!
//! Common types used across crates: the error system, fulfillment
//! commands/events/snapshots, persistent domain models, and utility
//! helpers.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use order::{
    Actor, ActorRole, CommandError, CommandErrorCode, CommandResponse, EventPayload,
    FulfillmentCommand, FulfillmentCommandPayload, OrderEvent, OrderEventType, OrderSnapshot,
    OrderStatus, ShipmentStatus,
};
