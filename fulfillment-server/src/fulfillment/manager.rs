//! FulfillmentManager - core command processing and event generation
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Apply events to snapshots via EventApplier
//!     ├─ 6. Persist events, snapshots, indices
//!     ├─ 7. Mark command processed
//!     ├─ 8. Commit transaction
//!     ├─ 9. Broadcast event(s)
//!     └─ 10. Return response
//! ```
//!
//! Everything between steps 2 and 8 happens in one redb write
//! transaction: order status, shipment, inventory and rider mutations
//! land together or roll back together.

use super::actions::{AssignRiderAction, CommandAction, PlaceOrderAction, ReleaseOrderAction};
use super::appliers::EventAction;
use super::storage::{FulfillmentStorage, StorageError};
use super::traits::{
    CommandContext, CommandHandler, CommandMetadata, EventApplier, FulfillmentError,
};
use crate::riders::AssignmentPolicy;
use chrono::Local;
use shared::models::{ProductVariant, Rider, Shipment};
use shared::order::{
    CommandError, CommandErrorCode, CommandResponse, FulfillmentCommand,
    FulfillmentCommandPayload, OrderEvent, OrderSnapshot, OrderStatus,
};
use std::path::Path;
use thiserror::Error;
use tokio::sync::broadcast;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Fulfillment(#[from] FulfillmentError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map storage failures to an error code (clients handle presentation)
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    if matches!(e, StorageError::Serialization(_)) {
        return CommandErrorCode::InternalError;
    }
    if let StorageError::OrderNotFound(_) = e {
        return CommandErrorCode::OrderNotFound;
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc") {
        return CommandErrorCode::StorageFull;
    }
    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return CommandErrorCode::OutOfMemory;
    }
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    CommandErrorCode::SystemBusy
}

fn classify_fulfillment_error(err: &FulfillmentError) -> CommandErrorCode {
    match err {
        FulfillmentError::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
        FulfillmentError::VariantNotFound(_) => CommandErrorCode::VariantNotFound,
        FulfillmentError::VariantArchived(_) => CommandErrorCode::VariantArchived,
        FulfillmentError::ShipmentNotFound(_) => CommandErrorCode::ShipmentNotFound,
        FulfillmentError::RiderNotFound(_) => CommandErrorCode::RiderNotFound,
        FulfillmentError::InsufficientStock { .. } => CommandErrorCode::InsufficientStock,
        FulfillmentError::InvalidTransition { .. } | FulfillmentError::ShipmentTransition { .. } => {
            CommandErrorCode::InvalidTransition
        }
        FulfillmentError::NotAuthorized(_) => CommandErrorCode::NotAuthorized,
        FulfillmentError::Validation(_) => CommandErrorCode::ValidationFailed,
        FulfillmentError::Storage(e) => classify_storage_error(e),
    }
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let (code, message) = match &err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                (code, e.to_string())
            }
            ManagerError::Fulfillment(f) => (classify_fulfillment_error(f), f.to_string()),
            ManagerError::Internal(msg) => (CommandErrorCode::InternalError, msg.clone()),
        };
        CommandError::new(code, message)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 16384;

/// FulfillmentManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Clients use it to detect server restarts and refresh their state.
pub struct FulfillmentManager {
    storage: FulfillmentStorage,
    event_tx: broadcast::Sender<OrderEvent>,
    /// Server instance epoch - unique ID generated on startup
    epoch: String,
    /// Rider assignment knobs
    policy: AssignmentPolicy,
}

impl std::fmt::Debug for FulfillmentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentManager")
            .field("storage", &"<FulfillmentStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl FulfillmentManager {
    /// Create a new manager with the given database path
    pub fn new(db_path: impl AsRef<Path>, policy: AssignmentPolicy) -> ManagerResult<Self> {
        let storage = FulfillmentStorage::open(db_path)?;
        Ok(Self::with_storage(storage, policy))
    }

    /// Create a manager with existing storage
    pub fn with_storage(storage: FulfillmentStorage, policy: AssignmentPolicy) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "FulfillmentManager started with new epoch");
        Self {
            storage,
            event_tx,
            epoch,
            policy,
        }
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &FulfillmentStorage {
        &self.storage
    }

    /// Generate the next order number (crash-safe via redb counter).
    ///
    /// Human-readable, globally unique, never reused: `ORD-YYYYMMDD-NNNNN`.
    fn next_order_number(&self) -> String {
        let count = self.storage.next_order_count().unwrap_or(1);
        let date_str = Local::now().format("%Y%m%d").to_string();
        format!("ORD-{date_str}-{count:05}")
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: FulfillmentCommand) -> CommandResponse {
        match self.process_command(cmd.clone()) {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in events {
                    let _ = self.event_tx.send(event);
                }
                response
            }
            Err(err) => CommandResponse::error(cmd.command_id, err.into()),
        }
    }

    /// Process a command and return the response with generated events
    fn process_command(
        &self,
        cmd: FulfillmentCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        tracing::info!(
            command_id = %cmd.command_id,
            command = cmd.payload.name(),
            actor_id = cmd.actor.id,
            actor_role = %cmd.actor.role,
            "Processing command"
        );

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 2. Pre-generate the order number for PlaceOrder (BEFORE the
        // transaction - redb does not allow nested write transactions).
        // A failed checkout wastes a number; numbers are unique, not dense.
        let pre_generated_number = match &cmd.payload {
            FulfillmentCommandPayload::PlaceOrder { .. } => {
                let number = self.next_order_number();
                tracing::info!(order_number = %number, "Pre-generated order number");
                Some(number)
            }
            _ => None,
        };

        // 3. Begin write transaction
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within the transaction
        if self.storage.is_command_processed_txn(&txn, &cmd.command_id)? {
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 4. Context and metadata
        let current_sequence = self.storage.current_sequence_txn(&txn)?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor: cmd.actor,
            timestamp: cmd.timestamp,
        };

        // 5. Convert to action and execute.
        // PlaceOrder gets the pre-generated number; assignment-bearing
        // commands get the configured policy.
        let action: CommandAction = match &cmd.payload {
            FulfillmentCommandPayload::PlaceOrder {
                buyer_id,
                seller_id,
                address,
                items,
                shipping_fee,
                tax,
                discount,
            } => {
                let order_number = pre_generated_number
                    .clone()
                    .expect("order number must be pre-generated for PlaceOrder");
                CommandAction::PlaceOrder(PlaceOrderAction {
                    buyer_id: *buyer_id,
                    seller_id: *seller_id,
                    address: address.clone(),
                    items: items.clone(),
                    shipping_fee: *shipping_fee,
                    tax: *tax,
                    discount: *discount,
                    order_number,
                })
            }
            FulfillmentCommandPayload::ReleaseToRider { order_id } => {
                CommandAction::ReleaseOrder(ReleaseOrderAction {
                    order_id: order_id.clone(),
                    policy: self.policy,
                })
            }
            FulfillmentCommandPayload::AssignRider { order_id } => {
                CommandAction::AssignRider(AssignRiderAction {
                    order_id: order_id.clone(),
                    policy: self.policy,
                })
            }
            _ => (&cmd).into(),
        };
        let events = futures::executor::block_on(action.execute(&mut ctx, &metadata))?;

        // 6. Apply events to snapshots via EventApplier
        for event in &events {
            let mut snapshot = ctx
                .load_snapshot(&event.order_id)
                .unwrap_or_else(|_| OrderSnapshot::new(event.order_id.clone()));

            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);

            ctx.save_snapshot(snapshot);
        }

        // 7. Persist events
        for event in &events {
            self.storage.store_event(&txn, event)?;
        }

        // 8. Persist snapshots and maintain the open-orders index
        for snapshot in ctx.modified_snapshots() {
            self.storage.store_snapshot(&txn, snapshot)?;
            if snapshot.status.is_terminal() {
                self.storage.mark_order_closed(&txn, &snapshot.order_id)?;
            } else {
                self.storage.mark_order_open(&txn, &snapshot.order_id)?;
            }
        }

        // 9. Response fields (before the context goes away)
        let order_id = events
            .first()
            .map(|e| e.order_id.clone())
            .or_else(|| cmd.payload.order_id().map(str::to_string));
        let status: Option<OrderStatus> = order_id.as_ref().and_then(|id| {
            ctx.modified_snapshots()
                .find(|s| &s.order_id == id)
                .map(|s| s.status)
        });

        // 10. Advance the global sequence
        let max_sequence = ctx.current_sequence();
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }

        // 11. Mark command processed
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;

        // 12. Commit
        drop(ctx);
        txn.commit().map_err(StorageError::from)?;

        // 13. Response
        let mut response = CommandResponse::success(cmd.command_id.clone(), order_id.clone());
        if let Some(number) = pre_generated_number {
            response = response.with_order_number(number);
        }
        if let Some(status) = status {
            response = response.with_status(status);
        }

        tracing::info!(
            command_id = %cmd.command_id,
            order_id = ?order_id,
            event_count = events.len(),
            "Command processed successfully"
        );
        Ok((response, events))
    }

    // ========== Public Query Methods ==========

    /// Get a snapshot by order ID
    pub fn get_snapshot(&self, order_id: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.storage.get_snapshot(order_id)?)
    }

    /// Get all open (non-terminal) order snapshots
    pub fn get_open_orders(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.get_open_orders()?)
    }

    /// Get the event stream for an order
    pub fn get_events_for_order(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.storage.get_events_for_order(order_id)?)
    }

    /// Rebuild a snapshot from events (for verification)
    ///
    /// Uses EventApplier to apply each event in sequence; the result
    /// must match the stored snapshot.
    pub fn rebuild_snapshot(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let events = self.storage.get_events_for_order(order_id)?;
        if events.is_empty() {
            return Err(ManagerError::Fulfillment(FulfillmentError::OrderNotFound(
                order_id.to_string(),
            )));
        }

        let mut snapshot = OrderSnapshot::new(order_id.to_string());
        for event in &events {
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
        }

        Ok(snapshot)
    }

    /// Get the shipment for an order
    pub fn get_shipment_for_order(&self, order_id: &str) -> ManagerResult<Option<Shipment>> {
        Ok(self.storage.get_shipment_for_order(order_id)?)
    }

    /// Get a shipment by its ID
    pub fn get_shipment(&self, shipment_id: i64) -> ManagerResult<Option<Shipment>> {
        Ok(self.storage.get_shipment_by_id(shipment_id)?)
    }

    /// Orders whose shipments await a rider
    pub fn list_backlog(&self) -> ManagerResult<Vec<String>> {
        Ok(self.storage.list_unassigned_order_ids()?)
    }

    // ========== Inventory / Rider Administration ==========

    /// Create or update a product variant
    pub fn upsert_variant(&self, variant: &ProductVariant) -> ManagerResult<()> {
        if variant.on_hand < 0 || variant.reserved < 0 || !variant.is_consistent() {
            return Err(ManagerError::Fulfillment(FulfillmentError::Validation(
                format!(
                    "inconsistent stock for variant {}: on_hand={}, reserved={}",
                    variant.id, variant.on_hand, variant.reserved
                ),
            )));
        }
        Ok(self.storage.upsert_variant(variant)?)
    }

    /// Get a variant by ID
    pub fn get_variant(&self, variant_id: i64) -> ManagerResult<Option<ProductVariant>> {
        Ok(self.storage.get_variant(variant_id)?)
    }

    /// Register or update a rider
    pub fn upsert_rider(&self, rider: &Rider) -> ManagerResult<()> {
        Ok(self.storage.upsert_rider(rider)?)
    }

    /// Get a rider by ID
    pub fn get_rider(&self, rider_id: i64) -> ManagerResult<Option<Rider>> {
        Ok(self.storage.get_rider(rider_id)?)
    }

    /// List all riders
    pub fn list_riders(&self) -> ManagerResult<Vec<Rider>> {
        Ok(self.storage.list_riders()?)
    }

    /// Flip a rider's availability flag
    pub fn set_rider_availability(
        &self,
        rider_id: i64,
        is_available: bool,
    ) -> ManagerResult<Option<Rider>> {
        let Some(mut rider) = self.storage.get_rider(rider_id)? else {
            return Ok(None);
        };
        rider.is_available = is_available;
        self.storage.upsert_rider(&rider)?;
        Ok(Some(rider))
    }
}

// Make FulfillmentManager Clone-able (all fields are shared handles)
impl Clone for FulfillmentManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            event_tx: self.event_tx.clone(),
            epoch: self.epoch.clone(),
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{AddressSnapshot, RiderStatus, VehicleType};
    use shared::order::{
        Actor, ActorRole, LineItemInput, OrderEventType, ShipmentStatus, StockReservation,
    };

    fn create_test_manager() -> FulfillmentManager {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        FulfillmentManager::with_storage(storage, AssignmentPolicy::default())
    }

    fn test_address() -> AddressSnapshot {
        AddressSnapshot {
            full_name: "Test Buyer".to_string(),
            phone: "0900000000".to_string(),
            street: "1 Main St".to_string(),
            city: "Quezon City".to_string(),
            province: "Metro Manila".to_string(),
            postal_code: None,
        }
    }

    fn seed_variant(manager: &FulfillmentManager, on_hand: i64) -> i64 {
        let variant = ProductVariant::new(10, "Shirt", "SH-M", "19.99".parse().unwrap(), on_hand);
        let id = variant.id;
        manager.upsert_variant(&variant).unwrap();
        id
    }

    fn seed_rider(manager: &FulfillmentManager) -> i64 {
        let mut rider = Rider::new("Dan", VehicleType::Motorcycle);
        rider.status = RiderStatus::Active;
        let id = rider.id;
        manager.upsert_rider(&rider).unwrap();
        id
    }

    fn place_order_cmd(variant_id: i64, qty: i32) -> FulfillmentCommand {
        FulfillmentCommand::new(
            Actor::new(1, ActorRole::Buyer),
            FulfillmentCommandPayload::PlaceOrder {
                buyer_id: 1,
                seller_id: 2,
                address: test_address(),
                items: vec![LineItemInput {
                    variant_id,
                    quantity: qty,
                    unit_price: "19.99".parse().unwrap(),
                }],
                shipping_fee: "5.00".parse().unwrap(),
                tax: "0".parse().unwrap(),
                discount: "0".parse().unwrap(),
            },
        )
    }

    fn place_order(manager: &FulfillmentManager, variant_id: i64, qty: i32) -> String {
        let response = manager.execute_command(place_order_cmd(variant_id, qty));
        assert!(response.success, "{:?}", response.error);
        response.order_id.unwrap()
    }

    #[test]
    fn test_place_order_persists_snapshot() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);

        let response = manager.execute_command(place_order_cmd(variant_id, 3));
        assert!(response.success);
        assert!(response.order_number.is_some());
        assert_eq!(response.status, Some(OrderStatus::Pending));

        let order_id = response.order_id.unwrap();
        let snapshot = manager.get_snapshot(&order_id).unwrap().unwrap();
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.reservation, StockReservation::Held);
        assert_eq!(snapshot.order_number, response.order_number.unwrap());

        let variant = manager.get_variant(variant_id).unwrap().unwrap();
        assert_eq!(variant.reserved, 3);
        assert_eq!(variant.on_hand, 10);
    }

    #[test]
    fn test_full_happy_path() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);
        let rider_id = seed_rider(&manager);
        let order_id = place_order(&manager, variant_id, 2);

        let seller = Actor::new(2, ActorRole::Seller);

        let response = manager.execute_command(FulfillmentCommand::new(
            seller,
            FulfillmentCommandPayload::ConfirmOrder {
                order_id: order_id.clone(),
            },
        ));
        assert!(response.success);
        assert_eq!(response.status, Some(OrderStatus::Confirmed));

        let response = manager.execute_command(FulfillmentCommand::new(
            seller,
            FulfillmentCommandPayload::ReleaseToRider {
                order_id: order_id.clone(),
            },
        ));
        assert!(response.success);
        assert_eq!(response.status, Some(OrderStatus::ReleasedToRider));

        let shipment = manager.get_shipment_for_order(&order_id).unwrap().unwrap();
        assert_eq!(shipment.rider_id, Some(rider_id));

        let response = manager.execute_command(FulfillmentCommand::new(
            Actor::new(rider_id, ActorRole::Rider),
            FulfillmentCommandPayload::MarkDelivered {
                shipment_id: shipment.id,
            },
        ));
        assert!(response.success, "{:?}", response.error);
        assert_eq!(response.status, Some(OrderStatus::Delivered));

        // Stock permanently decremented exactly once
        let variant = manager.get_variant(variant_id).unwrap().unwrap();
        assert_eq!(variant.on_hand, 8);
        assert_eq!(variant.reserved, 0);

        // Delivered orders leave the open index
        assert!(manager.get_open_orders().unwrap().is_empty());

        // Recorded statuses form a legal path
        let events = manager.get_events_for_order(&order_id).unwrap();
        let kinds: Vec<OrderEventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                OrderEventType::OrderPlaced,
                OrderEventType::OrderConfirmed,
                OrderEventType::OrderReleased,
                OrderEventType::RiderAssigned,
                OrderEventType::OrderDelivered,
            ]
        );
    }

    #[test]
    fn test_invalid_transition_surfaces_error() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);
        let order_id = place_order(&manager, variant_id, 1);

        // Release before confirmation
        let response = manager.execute_command(FulfillmentCommand::new(
            Actor::new(2, ActorRole::Seller),
            FulfillmentCommandPayload::ReleaseToRider {
                order_id: order_id.clone(),
            },
        ));
        assert!(!response.success);
        assert_eq!(
            response.error.unwrap().code,
            CommandErrorCode::InvalidTransition
        );

        // Status unchanged
        let snapshot = manager.get_snapshot(&order_id).unwrap().unwrap();
        assert_eq!(snapshot.status, OrderStatus::Pending);
    }

    #[test]
    fn test_duplicate_command_is_noop() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);

        let cmd = place_order_cmd(variant_id, 2);
        let first = manager.execute_command(cmd.clone());
        assert!(first.success);

        let second = manager.execute_command(cmd);
        assert!(second.success);
        assert!(second.order_id.is_none());

        // Only one reservation despite two deliveries of the command
        let variant = manager.get_variant(variant_id).unwrap().unwrap();
        assert_eq!(variant.reserved, 2);
    }

    #[test]
    fn test_cancel_releases_stock_and_is_idempotent() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 5);
        let order_id = place_order(&manager, variant_id, 3);

        let cancel = |reason: &str| {
            manager.execute_command(FulfillmentCommand::new(
                Actor::new(1, ActorRole::Buyer),
                FulfillmentCommandPayload::CancelOrder {
                    order_id: order_id.clone(),
                    reason: Some(reason.to_string()),
                },
            ))
        };

        let response = cancel("first");
        assert!(response.success);

        let variant = manager.get_variant(variant_id).unwrap().unwrap();
        assert_eq!(variant.reserved, 0);
        assert_eq!(variant.on_hand, 5);

        // Second cancel: success, no double release
        let response = cancel("second");
        assert!(response.success);
        let variant = manager.get_variant(variant_id).unwrap().unwrap();
        assert_eq!(variant.reserved, 0);

        let snapshot = manager.get_snapshot(&order_id).unwrap().unwrap();
        assert_eq!(snapshot.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_reservation_scenario_from_contention() {
        // on_hand=5: A reserves 3, B's 3 fails, A cancels, B retries fine
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 5);

        let order_a = place_order(&manager, variant_id, 3);

        let response_b = manager.execute_command(place_order_cmd(variant_id, 3));
        assert!(!response_b.success);
        assert_eq!(
            response_b.error.unwrap().code,
            CommandErrorCode::InsufficientStock
        );
        let variant = manager.get_variant(variant_id).unwrap().unwrap();
        assert_eq!(variant.reserved, 3);

        let response = manager.execute_command(FulfillmentCommand::new(
            Actor::new(1, ActorRole::Buyer),
            FulfillmentCommandPayload::CancelOrder {
                order_id: order_a,
                reason: None,
            },
        ));
        assert!(response.success);

        let retry = manager.execute_command(place_order_cmd(variant_id, 3));
        assert!(retry.success);
        let variant = manager.get_variant(variant_id).unwrap().unwrap();
        assert_eq!(variant.reserved, 3);
        assert_eq!(variant.on_hand, 5);
    }

    #[test]
    fn test_release_without_rider_is_backlog() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);
        let order_id = place_order(&manager, variant_id, 1);

        let seller = Actor::new(2, ActorRole::Seller);
        manager.execute_command(FulfillmentCommand::new(
            seller,
            FulfillmentCommandPayload::ConfirmOrder {
                order_id: order_id.clone(),
            },
        ));
        let response = manager.execute_command(FulfillmentCommand::new(
            seller,
            FulfillmentCommandPayload::ReleaseToRider {
                order_id: order_id.clone(),
            },
        ));
        assert!(response.success);
        assert_eq!(response.status, Some(OrderStatus::ReleasedToRider));

        let shipment = manager.get_shipment_for_order(&order_id).unwrap().unwrap();
        assert_eq!(shipment.rider_id, None);
        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert_eq!(manager.list_backlog().unwrap(), vec![order_id.clone()]);

        // A rider comes online; the retry command assigns them
        let rider_id = seed_rider(&manager);
        let response = manager.execute_command(FulfillmentCommand::new(
            Actor::system(),
            FulfillmentCommandPayload::AssignRider {
                order_id: order_id.clone(),
            },
        ));
        assert!(response.success);
        let shipment = manager.get_shipment_for_order(&order_id).unwrap().unwrap();
        assert_eq!(shipment.rider_id, Some(rider_id));
        assert!(manager.list_backlog().unwrap().is_empty());
    }

    #[test]
    fn test_rebuild_matches_stored_snapshot() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);
        seed_rider(&manager);
        let order_id = place_order(&manager, variant_id, 2);

        let seller = Actor::new(2, ActorRole::Seller);
        for payload in [
            FulfillmentCommandPayload::ConfirmOrder {
                order_id: order_id.clone(),
            },
            FulfillmentCommandPayload::StartProcessing {
                order_id: order_id.clone(),
            },
            FulfillmentCommandPayload::MarkReadyForPickup {
                order_id: order_id.clone(),
            },
            FulfillmentCommandPayload::ReleaseToRider {
                order_id: order_id.clone(),
            },
        ] {
            let response = manager.execute_command(FulfillmentCommand::new(seller, payload));
            assert!(response.success, "{:?}", response.error);
        }

        let stored = manager.get_snapshot(&order_id).unwrap().unwrap();
        let rebuilt = manager.rebuild_snapshot(&order_id).unwrap();
        assert_eq!(stored, rebuilt);
    }

    #[test]
    fn test_event_broadcast() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);
        let mut rx = manager.subscribe();

        place_order(&manager, variant_id, 1);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event_type, OrderEventType::OrderPlaced);
    }

    #[test]
    fn test_order_numbers_are_unique_and_formatted() {
        let manager = create_test_manager();
        let variant_id = seed_variant(&manager, 10);

        let a = manager.execute_command(place_order_cmd(variant_id, 1));
        let b = manager.execute_command(place_order_cmd(variant_id, 1));
        let na = a.order_number.unwrap();
        let nb = b.order_number.unwrap();
        assert_ne!(na, nb);
        assert!(na.starts_with("ORD-"));
    }

    #[test]
    fn test_upsert_variant_rejects_inconsistent_stock() {
        let manager = create_test_manager();
        let mut variant = ProductVariant::new(1, "Shirt", "SH-M", "19.99".parse().unwrap(), 2);
        variant.reserved = 5;
        let result = manager.upsert_variant(&variant);
        assert!(result.is_err());
    }
}
