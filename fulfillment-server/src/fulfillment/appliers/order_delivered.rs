//! OrderDelivered event applier

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus, StockReservation};

/// OrderDelivered applier
pub struct OrderDeliveredApplier;

impl EventApplier for OrderDeliveredApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderDelivered { shipment_id } = &event.payload {
            snapshot.status = OrderStatus::Delivered;
            snapshot.reservation = StockReservation::Committed;
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
    fn test_delivered_settles_reservation() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.status = OrderStatus::ReleasedToRider;
        snapshot.reservation = StockReservation::Held;

        let event = OrderEvent::new(
            5,
            "order-1".to_string(),
            Actor::new(7, ActorRole::Rider),
            "cmd-5".to_string(),
            None,
            OrderEventType::OrderDelivered,
            EventPayload::OrderDelivered { shipment_id: 42 },
        );

        OrderDeliveredApplier.apply(&mut snapshot, &event);
        assert_eq!(snapshot.status, OrderStatus::Delivered);
        assert_eq!(snapshot.reservation, StockReservation::Committed);
    }

    #[test]
    fn test_applying_twice_is_idempotent() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.status = OrderStatus::ReleasedToRider;

        let event = OrderEvent::new(
            5,
            "order-1".to_string(),
            Actor::new(7, ActorRole::Rider),
            "cmd-5".to_string(),
            None,
            OrderEventType::OrderDelivered,
            EventPayload::OrderDelivered { shipment_id: 42 },
        );

        OrderDeliveredApplier.apply(&mut snapshot, &event);
        let first = snapshot.clone();
        OrderDeliveredApplier.apply(&mut snapshot, &event);
        assert_eq!(snapshot, first);
    }
}
