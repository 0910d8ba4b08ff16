//! OrderCancelled event applier

use super::touch;
use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus, StockReservation};

/// OrderCancelled applier
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCancelled { reason, .. } = &event.payload {
            snapshot.status = OrderStatus::Cancelled;
            snapshot.reservation = StockReservation::Released;
            snapshot.closed_reason = reason.clone();
            touch(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{Actor, ActorRole, OrderEventType};

    #[test]
    fn test_cancelled_releases_reservation_marker() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.status = OrderStatus::Pending;

        let event = OrderEvent::new(
            2,
            "order-1".to_string(),
            Actor::new(1, ActorRole::Buyer),
            "cmd-2".to_string(),
            None,
            OrderEventType::OrderCancelled,
            EventPayload::OrderCancelled {
                reason: Some("changed my mind".to_string()),
                cancelled_by: ActorRole::Buyer,
            },
        );

        OrderCancelledApplier.apply(&mut snapshot, &event);
        assert_eq!(snapshot.status, OrderStatus::Cancelled);
        assert_eq!(snapshot.reservation, StockReservation::Released);
        assert_eq!(snapshot.closed_reason.as_deref(), Some("changed my mind"));
    }
}
