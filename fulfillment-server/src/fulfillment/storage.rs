//! redb-based storage layer for the fulfillment engine
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `events` | `(order_id, sequence)` | `OrderEvent` | Event stream (append-only) |
//! | `snapshots` | `order_id` | `OrderSnapshot` | Snapshot cache |
//! | `open_orders` | `order_id` | `()` | Non-terminal order index |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `counters` | name | `u64` | Global sequence, order count |
//! | `inventory` | `variant_id` | `ProductVariant` | Stock ledger |
//! | `riders` | `rider_id` | `Rider` | Rider registry |
//! | `shipments` | `order_id` | `Shipment` | Delivery records (1:1 with orders) |
//! | `shipment_orders` | `shipment_id` | `order_id` | Shipment id lookup |
//! | `unassigned_shipments` | `order_id` | `()` | Rider-assignment backlog |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns, using
//! copy-on-write with an atomic pointer swap: the database file is
//! always in a consistent state even across power loss.
//!
//! # Serialization
//!
//! Single-writer transactions serialize every mutation: a command's
//! order/shipment/inventory writes land together or not at all, and two
//! concurrent reservations on the same variant can never interleave.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::{ProductVariant, Rider, Shipment};
use shared::order::{OrderEvent, OrderSnapshot};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Event stream: key = (order_id, sequence), value = JSON-serialized OrderEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// Snapshots: key = order_id, value = JSON-serialized OrderSnapshot
const SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// Non-terminal orders: key = order_id, value = empty (existence check)
const OPEN_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("open_orders");

/// Processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Counters: key = "seq" or "order_count", value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Stock ledger: key = variant_id, value = JSON-serialized ProductVariant
const INVENTORY_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("inventory");

/// Rider registry: key = rider_id, value = JSON-serialized Rider
const RIDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("riders");

/// Shipments: key = order_id, value = JSON-serialized Shipment (1:1)
const SHIPMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("shipments");

/// Shipment id lookup: key = shipment_id, value = order_id
const SHIPMENT_ORDERS_TABLE: TableDefinition<i64, &str> = TableDefinition::new("shipment_orders");

/// Rider-assignment backlog: key = order_id, value = empty
const UNASSIGNED_SHIPMENTS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("unassigned_shipments");

const SEQUENCE_KEY: &str = "seq";
const ORDER_COUNT_KEY: &str = "order_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Fulfillment storage backed by redb
#[derive(Clone)]
pub struct FulfillmentStorage {
    db: Arc<Database>,
}

impl FulfillmentStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(OPEN_ORDERS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let _ = write_txn.open_table(INVENTORY_TABLE)?;
            let _ = write_txn.open_table(RIDERS_TABLE)?;
            let _ = write_txn.open_table(SHIPMENTS_TABLE)?;
            let _ = write_txn.open_table(SHIPMENT_ORDERS_TABLE)?;
            let _ = write_txn.open_table(UNASSIGNED_SHIPMENTS_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(SEQUENCE_KEY)?.is_none() {
                counters.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Get current sequence (within transaction)
    pub fn current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set sequence number (within transaction)
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Order Counter (for order numbers) ==========

    /// Get and increment the order count atomically.
    /// Returns the NEW count after increment (crash-safe, never reused).
    pub fn next_order_count(&self) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(ORDER_COUNT_KEY)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(ORDER_COUNT_KEY, next)?;
        drop(table);
        txn.commit()?;
        Ok(next)
    }

    // ========== Command Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Store an event
    pub fn store_event(&self, txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all events for an order, in sequence order
    pub fn get_events_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Get events since a given sequence (across all orders)
    pub fn get_events_since(&self, since_sequence: u64) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            if event.sequence > since_sequence {
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a snapshot by order ID
    pub fn get_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Get a snapshot by order ID (within transaction)
    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    // ========== Open Orders Index ==========

    /// Mark an order as open (non-terminal)
    pub fn mark_order_open(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    /// Mark an order as closed (terminal)
    pub fn mark_order_closed(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(OPEN_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Get all open order IDs
    pub fn get_open_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OPEN_ORDERS_TABLE)?;

        let mut order_ids: Vec<String> = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            order_ids.push(key.value().to_string());
        }

        Ok(order_ids)
    }

    /// Get all open order snapshots
    pub fn get_open_orders(&self) -> StorageResult<Vec<OrderSnapshot>> {
        let open_ids = self.get_open_order_ids()?;
        let mut snapshots = Vec::new();

        for order_id in open_ids {
            if let Some(snapshot) = self.get_snapshot(&order_id)? {
                snapshots.push(snapshot);
            }
        }

        Ok(snapshots)
    }

    // ========== Inventory ==========

    /// Store a variant (within transaction)
    pub fn put_variant(
        &self,
        txn: &WriteTransaction,
        variant: &ProductVariant,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(INVENTORY_TABLE)?;
        let value = serde_json::to_vec(variant)?;
        table.insert(variant.id, value.as_slice())?;
        Ok(())
    }

    /// Get a variant (within transaction)
    pub fn get_variant_txn(
        &self,
        txn: &WriteTransaction,
        variant_id: i64,
    ) -> StorageResult<Option<ProductVariant>> {
        let table = txn.open_table(INVENTORY_TABLE)?;
        match table.get(variant_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a variant (read-only)
    pub fn get_variant(&self, variant_id: i64) -> StorageResult<Option<ProductVariant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;
        match table.get(variant_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Store a variant in its own transaction (seeding/administration)
    pub fn upsert_variant(&self, variant: &ProductVariant) -> StorageResult<()> {
        let txn = self.begin_write()?;
        self.put_variant(&txn, variant)?;
        txn.commit()?;
        Ok(())
    }

    /// List all variants
    pub fn list_variants(&self) -> StorageResult<Vec<ProductVariant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;
        let mut variants = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            variants.push(serde_json::from_slice(value.value())?);
        }
        Ok(variants)
    }

    // ========== Riders ==========

    /// Store a rider (within transaction)
    pub fn put_rider(&self, txn: &WriteTransaction, rider: &Rider) -> StorageResult<()> {
        let mut table = txn.open_table(RIDERS_TABLE)?;
        let value = serde_json::to_vec(rider)?;
        table.insert(rider.id, value.as_slice())?;
        Ok(())
    }

    /// Get a rider (within transaction)
    pub fn get_rider_txn(
        &self,
        txn: &WriteTransaction,
        rider_id: i64,
    ) -> StorageResult<Option<Rider>> {
        let table = txn.open_table(RIDERS_TABLE)?;
        match table.get(rider_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a rider (read-only)
    pub fn get_rider(&self, rider_id: i64) -> StorageResult<Option<Rider>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RIDERS_TABLE)?;
        match table.get(rider_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Store a rider in its own transaction (registration/administration)
    pub fn upsert_rider(&self, rider: &Rider) -> StorageResult<()> {
        let txn = self.begin_write()?;
        self.put_rider(&txn, rider)?;
        txn.commit()?;
        Ok(())
    }

    /// List all riders (within transaction)
    pub fn list_riders_txn(&self, txn: &WriteTransaction) -> StorageResult<Vec<Rider>> {
        let table = txn.open_table(RIDERS_TABLE)?;
        let mut riders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            riders.push(serde_json::from_slice(value.value())?);
        }
        Ok(riders)
    }

    /// List all riders (read-only)
    pub fn list_riders(&self) -> StorageResult<Vec<Rider>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RIDERS_TABLE)?;
        let mut riders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            riders.push(serde_json::from_slice(value.value())?);
        }
        Ok(riders)
    }

    // ========== Shipments ==========

    /// Store a shipment, maintaining the shipment-id lookup
    pub fn put_shipment(&self, txn: &WriteTransaction, shipment: &Shipment) -> StorageResult<()> {
        let mut table = txn.open_table(SHIPMENTS_TABLE)?;
        let value = serde_json::to_vec(shipment)?;
        table.insert(shipment.order_id.as_str(), value.as_slice())?;
        drop(table);

        let mut index = txn.open_table(SHIPMENT_ORDERS_TABLE)?;
        index.insert(shipment.id, shipment.order_id.as_str())?;
        Ok(())
    }

    /// Get the shipment for an order (within transaction)
    pub fn get_shipment_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Shipment>> {
        let table = txn.open_table(SHIPMENTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get the shipment for an order (read-only)
    pub fn get_shipment_for_order(&self, order_id: &str) -> StorageResult<Option<Shipment>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHIPMENTS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Resolve a shipment id to its order (within transaction)
    pub fn get_shipment_by_id_txn(
        &self,
        txn: &WriteTransaction,
        shipment_id: i64,
    ) -> StorageResult<Option<Shipment>> {
        let index = txn.open_table(SHIPMENT_ORDERS_TABLE)?;
        let order_id = match index.get(shipment_id)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        drop(index);
        self.get_shipment_for_order_txn(txn, &order_id)
    }

    /// Resolve a shipment id to its order (read-only)
    pub fn get_shipment_by_id(&self, shipment_id: i64) -> StorageResult<Option<Shipment>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(SHIPMENT_ORDERS_TABLE)?;
        let order_id = match index.get(shipment_id)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        drop(index);
        let table = read_txn.open_table(SHIPMENTS_TABLE)?;
        match table.get(order_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Assignment Backlog ==========

    /// Index an order whose shipment has no rider yet
    pub fn mark_unassigned(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(UNASSIGNED_SHIPMENTS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    /// Remove an order from the assignment backlog
    pub fn clear_unassigned(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(UNASSIGNED_SHIPMENTS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// Order IDs whose shipments await a rider
    pub fn list_unassigned_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(UNASSIGNED_SHIPMENTS_TABLE)?;
        let mut order_ids = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            order_ids.push(key.value().to_string());
        }
        Ok(order_ids)
    }
}
