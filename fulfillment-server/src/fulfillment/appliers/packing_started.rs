//! PackingStarted event applier

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// PackingStarted applier
pub struct PackingStartedApplier;

impl EventApplier for PackingStartedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PackingStarted {} = &event.payload {
            snapshot.status = OrderStatus::Processing;
            touch(snapshot, event);
        }
    }
}
