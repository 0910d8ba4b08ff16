//! OrderPlaced event applier
//!
//! Builds the initial snapshot state from the checkout event.

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus, StockReservation};

/// OrderPlaced applier
pub struct OrderPlacedApplier;

impl EventApplier for OrderPlacedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderPlaced {
            order_number,
            buyer_id,
            seller_id,
            address,
            items,
            totals,
        } = &event.payload
        {
            // Set order_id from the event (important for replay scenarios)
            snapshot.order_id = event.order_id.clone();
            snapshot.order_number = order_number.clone();
            snapshot.buyer_id = *buyer_id;
            snapshot.seller_id = *seller_id;
            snapshot.address = address.clone();
            snapshot.items = items.clone();
            snapshot.totals = totals.clone();
            snapshot.status = OrderStatus::Pending;
            snapshot.reservation = StockReservation::Held;
            snapshot.created_at = event.timestamp;
            touch(snapshot, event);
        }
    }
}
