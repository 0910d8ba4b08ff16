//! OrderReturned event applier

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderReturned applier
pub struct OrderReturnedApplier;

impl EventApplier for OrderReturnedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderReturned { reason } = &event.payload {
            snapshot.status = OrderStatus::Returned;
            snapshot.closed_reason = reason.clone();
            touch(snapshot, event);
        }
    }
}
