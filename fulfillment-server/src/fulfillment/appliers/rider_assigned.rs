//! RiderAssigned event applier
//!
//! Assignment lives on the shipment record; the order snapshot only
//! records the bookkeeping fields.

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// RiderAssigned applier
pub struct RiderAssignedApplier;

impl EventApplier for RiderAssignedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::RiderAssigned { shipment_id, .. } = &event.payload {
            snapshot.shipment_id = Some(*shipment_id);
            touch(snapshot, event);
        }
    }
}
