//! MarkDelivered command handler
//!
//! Completes both machines in one transaction: shipment goes terminal,
//! the order moves to DELIVERED, the stock reservation is committed,
//! and the rider's load/statistics are updated.

use async_trait::async_trait;
use tracing::{info, warn};

use super::ensure_assigned_rider;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::inventory::ledger;
use shared::order::{
    EventPayload, OrderEvent, OrderEventType, OrderStatus, ShipmentStatus, StockReservation,
};

/// MarkDelivered action
#[derive(Debug, Clone)]
pub struct MarkDeliveredAction {
    pub shipment_id: i64,
}

#[async_trait]
impl CommandHandler for MarkDeliveredAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let mut shipment = ctx.shipment_by_id(self.shipment_id)?;
        ensure_assigned_rider(shipment.rider_id, &metadata.actor)?;

        if !shipment.status.can_transition(ShipmentStatus::Delivered) {
            return Err(FulfillmentError::ShipmentTransition {
                from: shipment.status,
                to: ShipmentStatus::Delivered,
            });
        }

        let snapshot = ctx.load_snapshot(&shipment.order_id)?;
        if !snapshot.status.can_transition(OrderStatus::Delivered) {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "MARK_DELIVERED".to_string(),
            });
        }

        // Settle the reservation: permanent decrement, exactly once.
        if snapshot.reservation == StockReservation::Held {
            for item in &snapshot.items {
                ledger::commit(ctx, item.variant_id, item.quantity as i64)?;
            }
        } else {
            warn!(
                order_id = %shipment.order_id,
                reservation = ?snapshot.reservation,
                "Reservation already settled, skipping stock commit"
            );
        }

        let now = shared::util::now_millis();
        shipment.status = ShipmentStatus::Delivered;
        shipment.delivered_at = Some(now);
        shipment.updated_at = now;
        ctx.put_shipment(&shipment)?;

        // Free the rider and credit the delivery
        if let Some(rider_id) = shipment.rider_id {
            let mut rider = ctx.rider(rider_id)?;
            rider.active_deliveries = rider.active_deliveries.saturating_sub(1);
            rider.total_deliveries += 1;
            ctx.put_rider(&rider)?;
        }

        info!(
            order_id = %shipment.order_id,
            shipment_id = shipment.id,
            rider_id = ?shipment.rider_id,
            "Order delivered"
        );

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            shipment.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderDelivered,
            EventPayload::OrderDelivered {
                shipment_id: shipment.id,
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::storage::FulfillmentStorage;
    use shared::models::{ProductVariant, Rider, RiderStatus, Shipment, VehicleType};
    use shared::order::{Actor, ActorRole, LineItemSnapshot, OrderSnapshot};

    fn metadata(actor: Actor) -> CommandMetadata {
        CommandMetadata {
            command_id: "cmd-1".to_string(),
            actor,
            timestamp: 1234567890,
        }
    }

    struct Fixture {
        storage: FulfillmentStorage,
        shipment_id: i64,
        rider_id: i64,
        variant_id: i64,
    }

    fn fixture(order_status: OrderStatus) -> Fixture {
        let storage = FulfillmentStorage::open_in_memory().unwrap();

        let mut variant = ProductVariant::new(10, "Shirt", "SH-M", "19.99".parse().unwrap(), 10);
        variant.reserved = 2;
        let variant_id = variant.id;
        storage.upsert_variant(&variant).unwrap();

        let mut rider = Rider::new("Dan", VehicleType::Motorcycle);
        rider.status = RiderStatus::Active;
        rider.active_deliveries = 1;
        let rider_id = rider.id;
        storage.upsert_rider(&rider).unwrap();

        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.status = order_status;
        snapshot.items.push(LineItemSnapshot {
            variant_id,
            product_id: 10,
            product_name: "Shirt".to_string(),
            sku: "SH-M".to_string(),
            size: None,
            color: None,
            quantity: 2,
            unit_price: "19.99".parse().unwrap(),
            line_subtotal: "39.98".parse().unwrap(),
        });

        let mut shipment = Shipment::new("order-1");
        shipment.rider_id = Some(rider_id);
        shipment.status = ShipmentStatus::OutForDelivery;
        let shipment_id = shipment.id;
        snapshot.shipment_id = Some(shipment_id);

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &snapshot).unwrap();
        storage.put_shipment(&txn, &shipment).unwrap();
        txn.commit().unwrap();

        Fixture {
            storage,
            shipment_id,
            rider_id,
            variant_id,
        }
    }

    #[tokio::test]
    async fn test_delivery_commits_stock_and_frees_rider() {
        let f = fixture(OrderStatus::ReleasedToRider);

        let txn = f.storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &f.storage, 0);

        let action = MarkDeliveredAction {
            shipment_id: f.shipment_id,
        };
        let events = action
            .execute(&mut ctx, &metadata(Actor::new(f.rider_id, ActorRole::Rider)))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, OrderEventType::OrderDelivered);

        let variant = ctx.variant(f.variant_id).unwrap();
        assert_eq!(variant.on_hand, 8);
        assert_eq!(variant.reserved, 0);

        let rider = ctx.rider(f.rider_id).unwrap();
        assert_eq!(rider.active_deliveries, 0);
        assert_eq!(rider.total_deliveries, 1);

        let shipment = ctx.shipment_by_id(f.shipment_id).unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        assert!(shipment.delivered_at.is_some());
    }

    #[tokio::test]
    async fn test_delivery_on_confirmed_order_rejected() {
        // Shipment record exists but the order never reached
        // RELEASED_TO_RIDER (e.g. stale replay): the order machine wins.
        let f = fixture(OrderStatus::Confirmed);

        let txn = f.storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &f.storage, 0);

        let action = MarkDeliveredAction {
            shipment_id: f.shipment_id,
        };
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(f.rider_id, ActorRole::Rider)))
            .await;

        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidTransition {
                from: OrderStatus::Confirmed,
                ..
            })
        ));

        // No side effects from the failed attempt
        let variant = ctx.variant(f.variant_id).unwrap();
        assert_eq!(variant.on_hand, 10);
        assert_eq!(variant.reserved, 2);
    }

    #[tokio::test]
    async fn test_delivered_shipment_cannot_deliver_again() {
        let f = fixture(OrderStatus::ReleasedToRider);
        let rider = Actor::new(f.rider_id, ActorRole::Rider);

        let txn = f.storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &f.storage, 0);

        let action = MarkDeliveredAction {
            shipment_id: f.shipment_id,
        };
        action.execute(&mut ctx, &metadata(rider)).await.unwrap();

        let result = action.execute(&mut ctx, &metadata(rider)).await;
        assert!(matches!(
            result,
            Err(FulfillmentError::ShipmentTransition {
                from: ShipmentStatus::Delivered,
                ..
            })
        ));

        // No double decrement
        let variant = ctx.variant(f.variant_id).unwrap();
        assert_eq!(variant.on_hand, 8);
    }

    #[tokio::test]
    async fn test_unassigned_rider_rejected() {
        let f = fixture(OrderStatus::ReleasedToRider);

        let txn = f.storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &f.storage, 0);

        let action = MarkDeliveredAction {
            shipment_id: f.shipment_id,
        };
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(999, ActorRole::Rider)))
            .await;
        assert!(matches!(result, Err(FulfillmentError::NotAuthorized(_))));
    }
}
