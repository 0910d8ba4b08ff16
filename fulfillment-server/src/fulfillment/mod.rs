//! Order fulfillment module
//!
//! Event-sourced command processing for the order lifecycle:
//!
//! - **manager**: FulfillmentManager - command validation, event
//!   generation, atomic persistence
//! - **storage**: redb-based persistence for events, snapshots,
//!   inventory, riders, shipments and indices
//! - **actions**: one CommandHandler per command
//! - **appliers**: one pure EventApplier per event
//! - **sweeper**: backlog retry and reservation expiry
//!
//! # Data flow
//!
//! 1. A caller submits a FulfillmentCommand
//! 2. FulfillmentManager validates and processes it in one transaction
//! 3. OrderEvents are generated with global sequence numbers
//! 4. Events, snapshots and side effects are persisted atomically
//! 5. Events are broadcast to subscribers (notification worker)
//! 6. CommandResponse is returned to the caller

pub mod traits;
pub mod actions;
pub mod appliers;
pub mod manager;
pub mod storage;
pub mod sweeper;

// Re-exports
pub use manager::{FulfillmentManager, ManagerError, ManagerResult};
pub use storage::{FulfillmentStorage, StorageError};
pub use sweeper::FulfillmentSweeper;

// Re-export shared types for convenience
pub use shared::order::{
    CommandError, CommandErrorCode, CommandResponse, EventPayload, FulfillmentCommand,
    FulfillmentCommandPayload, OrderEvent, OrderEventType, OrderSnapshot, OrderStatus,
};
