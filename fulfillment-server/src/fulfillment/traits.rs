//! Core traits and context for command processing
//!
//! - [`CommandHandler`]: one implementation per command, validates and
//!   produces events
//! - [`EventApplier`]: one implementation per event, pure snapshot
//!   mutation
//! - [`CommandContext`]: transactional view handed to actions - snapshot
//!   cache, sequence allocator, and access to inventory, riders and
//!   shipments inside the same write transaction

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use shared::models::{ProductVariant, Rider, Shipment};
use shared::order::{Actor, OrderEvent, OrderSnapshot, OrderStatus, ShipmentStatus};
use std::collections::HashMap;
use thiserror::Error;

use super::storage::{FulfillmentStorage, StorageError};

/// Errors produced by command validation and execution
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product variant not found: {0}")]
    VariantNotFound(i64),

    #[error("Product variant {0} is archived")]
    VariantArchived(i64),

    #[error("Shipment not found: {0}")]
    ShipmentNotFound(i64),

    #[error("Rider not found: {0}")]
    RiderNotFound(i64),

    #[error(
        "Insufficient stock for variant {variant_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        variant_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Event {event} is not valid in {from} status")]
    InvalidTransition { from: OrderStatus, event: String },

    #[error("Shipment cannot move from {from} to {to}")]
    ShipmentTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

/// Metadata extracted from the triggering command
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor: Actor,
    /// Client timestamp (Unix millis)
    pub timestamp: i64,
}

/// Transactional context for command execution.
///
/// Everything an action touches goes through this context, so the whole
/// command lands in one redb write transaction: dropping the transaction
/// on error rolls back order, shipment and inventory changes together.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a FulfillmentStorage,
    sequence: u64,
    /// Snapshots modified during this command (pending persistence)
    snapshots: HashMap<String, OrderSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a FulfillmentStorage,
        current_sequence: u64,
    ) -> Self {
        Self {
            txn,
            storage,
            sequence: current_sequence,
            snapshots: HashMap::new(),
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Highest sequence allocated so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    // ========== Snapshots ==========

    /// Load an order snapshot, preferring uncommitted modifications
    pub fn load_snapshot(&self, order_id: &str) -> FulfillmentResult<OrderSnapshot> {
        if let Some(snapshot) = self.snapshots.get(order_id) {
            return Ok(snapshot.clone());
        }
        self.storage
            .get_snapshot_txn(self.txn, order_id)?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))
    }

    /// Stage a modified snapshot for persistence at commit
    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.snapshots.insert(snapshot.order_id.clone(), snapshot);
    }

    /// Snapshots modified during this command
    pub fn modified_snapshots(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.snapshots.values()
    }

    // ========== Inventory ==========

    pub fn variant(&self, variant_id: i64) -> FulfillmentResult<ProductVariant> {
        self.storage
            .get_variant_txn(self.txn, variant_id)?
            .ok_or(FulfillmentError::VariantNotFound(variant_id))
    }

    pub fn put_variant(&self, variant: &ProductVariant) -> FulfillmentResult<()> {
        Ok(self.storage.put_variant(self.txn, variant)?)
    }

    // ========== Shipments ==========

    pub fn shipment_by_id(&self, shipment_id: i64) -> FulfillmentResult<Shipment> {
        self.storage
            .get_shipment_by_id_txn(self.txn, shipment_id)?
            .ok_or(FulfillmentError::ShipmentNotFound(shipment_id))
    }

    pub fn shipment_for_order(&self, order_id: &str) -> FulfillmentResult<Option<Shipment>> {
        Ok(self.storage.get_shipment_for_order_txn(self.txn, order_id)?)
    }

    pub fn put_shipment(&self, shipment: &Shipment) -> FulfillmentResult<()> {
        Ok(self.storage.put_shipment(self.txn, shipment)?)
    }

    pub fn mark_unassigned(&self, order_id: &str) -> FulfillmentResult<()> {
        Ok(self.storage.mark_unassigned(self.txn, order_id)?)
    }

    pub fn clear_unassigned(&self, order_id: &str) -> FulfillmentResult<()> {
        Ok(self.storage.clear_unassigned(self.txn, order_id)?)
    }

    // ========== Riders ==========

    pub fn rider(&self, rider_id: i64) -> FulfillmentResult<Rider> {
        self.storage
            .get_rider_txn(self.txn, rider_id)?
            .ok_or(FulfillmentError::RiderNotFound(rider_id))
    }

    pub fn put_rider(&self, rider: &Rider) -> FulfillmentResult<()> {
        Ok(self.storage.put_rider(self.txn, rider)?)
    }

    pub fn list_riders(&self) -> FulfillmentResult<Vec<Rider>> {
        Ok(self.storage.list_riders_txn(self.txn)?)
    }
}

/// A command handler validates one command and produces events.
///
/// Handlers never mutate snapshots directly; status evolution flows
/// through [`EventApplier`]s so replay reproduces identical state.
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError>;
}

/// An event applier is a PURE function from (snapshot, event) to the
/// next snapshot state.
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}
