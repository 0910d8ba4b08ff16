//! OrderReleased event applier

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderReleased applier
pub struct OrderReleasedApplier;

impl EventApplier for OrderReleasedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderReleased { shipment_id, .. } = &event.payload {
            snapshot.status = OrderStatus::ReleasedToRider;
            snapshot.shipment_id = Some(*shipment_id);
            touch(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{Actor, ActorRole, OrderEventType};

    #[test]
    fn test_released_links_shipment() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.status = OrderStatus::Confirmed;

        let event = OrderEvent::new(
            3,
            "order-1".to_string(),
            Actor::new(2, ActorRole::Seller),
            "cmd-3".to_string(),
            None,
            OrderEventType::OrderReleased,
            EventPayload::OrderReleased {
                shipment_id: 42,
                tracking_number: "TRK-0000000000042".to_string(),
            },
        );

        OrderReleasedApplier.apply(&mut snapshot, &event);
        assert_eq!(snapshot.status, OrderStatus::ReleasedToRider);
        assert_eq!(snapshot.shipment_id, Some(42));
    }
}
