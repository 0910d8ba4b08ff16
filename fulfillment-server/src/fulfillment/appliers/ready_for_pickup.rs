//! ReadyForPickup event applier

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// ReadyForPickup applier
pub struct ReadyForPickupApplier;

impl EventApplier for ReadyForPickupApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ReadyForPickup {} = &event.payload {
            snapshot.status = OrderStatus::WaitingForPickup;
            touch(snapshot, event);
        }
    }
}
