//! ShipmentProgressed event applier
//!
//! Shipment progress never feeds back into order status; the order
//! stays RELEASED_TO_RIDER until delivery. Bookkeeping only.

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// ShipmentProgressed applier
pub struct ShipmentProgressedApplier;

impl EventApplier for ShipmentProgressedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ShipmentProgressed { .. } = &event.payload {
            touch(snapshot, event);
        }
    }
}
