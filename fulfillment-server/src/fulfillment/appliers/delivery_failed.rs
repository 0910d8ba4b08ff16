//! DeliveryFailed event applier
//!
//! The order stays RELEASED_TO_RIDER; the terminal state lives on the
//! shipment record.

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// DeliveryFailed applier
pub struct DeliveryFailedApplier;

impl EventApplier for DeliveryFailedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::DeliveryFailed { .. } = &event.payload {
            touch(snapshot, event);
        }
    }
}
