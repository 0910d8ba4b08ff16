//! OrderConfirmed event applier

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderConfirmed applier
pub struct OrderConfirmedApplier;

impl EventApplier for OrderConfirmedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderConfirmed {} = &event.payload {
            snapshot.status = OrderStatus::Confirmed;
            touch(snapshot, event);
        }
    }
}
