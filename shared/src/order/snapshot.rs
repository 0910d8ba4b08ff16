//! Order snapshot - computed state from the event stream

use super::status::OrderStatus;
use crate::models::AddressSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of one line item, captured at checkout.
///
/// Decoupled from the live [`crate::models::ProductVariant`] so later
/// price or name edits never retroactively alter historical orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemSnapshot {
    pub variant_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: i32,
    /// Price at time of purchase
    pub unit_price: Decimal,
    /// unit_price * quantity
    pub line_subtotal: Decimal,
}

/// Monetary totals of an order.
///
/// Invariant: `total = subtotal + shipping_fee + tax - discount`,
/// computed once at creation and never silently mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from components, enforcing the invariant.
    pub fn compute(subtotal: Decimal, shipping_fee: Decimal, tax: Decimal, discount: Decimal) -> Self {
        Self {
            subtotal,
            shipping_fee,
            tax,
            discount,
            total: subtotal + shipping_fee + tax - discount,
        }
    }

    /// Verify the totals invariant holds.
    pub fn is_consistent(&self) -> bool {
        self.total == self.subtotal + self.shipping_fee + self.tax - self.discount
    }
}

/// Lifecycle of the stock reservation backing an order.
///
/// Drives ledger idempotency: commit/release against an already-settled
/// reservation is a logged no-op, never a second mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockReservation {
    /// Reserved at checkout, not yet settled
    #[default]
    Held,
    /// Permanently decremented on delivery
    Committed,
    /// Returned to available stock on cancellation
    Released,
}

/// Order snapshot - computed from the event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by server)
    pub order_id: String,
    /// Human-readable order number, globally unique, never reused
    pub order_number: String,
    pub buyer_id: i64,
    pub seller_id: i64,
    /// Order status
    pub status: OrderStatus,
    /// Shipping address captured at checkout
    pub address: AddressSnapshot,
    /// Immutable line items
    pub items: Vec<LineItemSnapshot>,
    /// Monetary totals
    pub totals: OrderTotals,
    /// Stock reservation state
    #[serde(default)]
    pub reservation: StockReservation,
    /// Shipment backing this order, once released
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<i64>,
    /// Cancellation/return reason, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<String>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last status-change timestamp
    pub updated_at: i64,
    /// Last applied event sequence (for incremental updates)
    pub last_sequence: u64,
}

impl OrderSnapshot {
    /// Create a new empty snapshot; fields are filled by the
    /// ORDER_PLACED applier.
    pub fn new(order_id: String) -> Self {
        let now = crate::util::now_millis();
        Self {
            order_id,
            order_number: String::new(),
            buyer_id: 0,
            seller_id: 0,
            status: OrderStatus::Pending,
            address: AddressSnapshot::default(),
            items: Vec::new(),
            totals: OrderTotals::default(),
            reservation: StockReservation::Held,
            shipment_id: None,
            closed_reason: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
        }
    }

    /// Total quantity across all line items
    pub fn total_quantity(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
