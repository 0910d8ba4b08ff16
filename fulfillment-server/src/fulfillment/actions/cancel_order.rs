//! CancelOrder command handler
//!
//! Cancellation is legal from PENDING or CONFIRMED and releases the
//! stock reservation. Cancelling an already-cancelled order is an
//! idempotent no-op: no error, no second release.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::inventory::ledger;
use shared::order::{
    ActorRole, EventPayload, OrderEvent, OrderEventType, OrderSnapshot, OrderStatus,
    StockReservation,
};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

fn ensure_may_cancel(
    snapshot: &OrderSnapshot,
    metadata: &CommandMetadata,
) -> Result<(), FulfillmentError> {
    let actor = &metadata.actor;
    match actor.role {
        ActorRole::Admin | ActorRole::System => Ok(()),
        ActorRole::Buyer if actor.id == snapshot.buyer_id => Ok(()),
        ActorRole::Seller if actor.id == snapshot.seller_id => Ok(()),
        ActorRole::Buyer | ActorRole::Seller => Err(FulfillmentError::NotAuthorized(format!(
            "{} {} is not a party to order {}",
            actor.role, actor.id, snapshot.order_id
        ))),
        role => Err(FulfillmentError::NotAuthorized(format!(
            "{role} cannot cancel orders"
        ))),
    }
}

#[async_trait]
impl CommandHandler for CancelOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_may_cancel(&snapshot, metadata)?;

        // Idempotent: a second cancellation is a no-op, not an error
        if snapshot.status == OrderStatus::Cancelled {
            warn!(order_id = %self.order_id, "Order already cancelled, ignoring");
            return Ok(vec![]);
        }

        if !snapshot.status.is_cancellable() {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "CANCEL_ORDER".to_string(),
            });
        }

        // Release reservations exactly once
        if snapshot.reservation == StockReservation::Held {
            for item in &snapshot.items {
                ledger::release(ctx, item.variant_id, item.quantity as i64)?;
            }
        } else {
            warn!(
                order_id = %self.order_id,
                reservation = ?snapshot.reservation,
                "Reservation already settled, skipping stock release"
            );
        }

        info!(
            order_id = %self.order_id,
            cancelled_by = %metadata.actor.role,
            reason = ?self.reason,
            "Order cancelled"
        );

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderCancelled,
            EventPayload::OrderCancelled {
                reason: self.reason.clone(),
                cancelled_by: metadata.actor.role,
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::storage::FulfillmentStorage;
    use shared::models::ProductVariant;
    use shared::order::{Actor, LineItemSnapshot};

    fn metadata(actor: Actor) -> CommandMetadata {
        CommandMetadata {
            command_id: "cmd-1".to_string(),
            actor,
            timestamp: 1234567890,
        }
    }

    fn fixture(status: OrderStatus, reservation: StockReservation) -> (FulfillmentStorage, i64) {
        let storage = FulfillmentStorage::open_in_memory().unwrap();

        let mut variant = ProductVariant::new(10, "Shirt", "SH-M", "19.99".parse().unwrap(), 10);
        variant.reserved = 3;
        let variant_id = variant.id;
        storage.upsert_variant(&variant).unwrap();

        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.buyer_id = 1;
        snapshot.seller_id = 2;
        snapshot.status = status;
        snapshot.reservation = reservation;
        snapshot.items.push(LineItemSnapshot {
            variant_id,
            product_id: 10,
            product_name: "Shirt".to_string(),
            sku: "SH-M".to_string(),
            size: None,
            color: None,
            quantity: 3,
            unit_price: "19.99".parse().unwrap(),
            line_subtotal: "59.97".parse().unwrap(),
        });

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &snapshot).unwrap();
        txn.commit().unwrap();
        (storage, variant_id)
    }

    #[tokio::test]
    async fn test_buyer_cancels_pending_order() {
        let (storage, variant_id) = fixture(OrderStatus::Pending, StockReservation::Held);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CancelOrderAction {
            order_id: "order-1".to_string(),
            reason: Some("changed my mind".to_string()),
        };
        let events = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        if let EventPayload::OrderCancelled { cancelled_by, .. } = &events[0].payload {
            assert_eq!(*cancelled_by, ActorRole::Buyer);
        } else {
            panic!("Expected OrderCancelled payload");
        }

        // Reservation released, on-hand intact
        let variant = ctx.variant(variant_id).unwrap();
        assert_eq!(variant.reserved, 0);
        assert_eq!(variant.on_hand, 10);
    }

    #[tokio::test]
    async fn test_seller_and_system_can_cancel() {
        let (storage, _) = fixture(OrderStatus::Confirmed, StockReservation::Held);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CancelOrderAction {
            order_id: "order-1".to_string(),
            reason: None,
        };
        let events = action
            .execute(&mut ctx, &metadata(Actor::new(2, ActorRole::Seller)))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);

        let (storage, _) = fixture(OrderStatus::Pending, StockReservation::Held);
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let events = action
            .execute(&mut ctx, &metadata(Actor::system()))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_stranger_cannot_cancel() {
        let (storage, _) = fixture(OrderStatus::Pending, StockReservation::Held);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CancelOrderAction {
            order_id: "order-1".to_string(),
            reason: None,
        };
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(99, ActorRole::Buyer)))
            .await;
        assert!(matches!(result, Err(FulfillmentError::NotAuthorized(_))));

        let result = action
            .execute(&mut ctx, &metadata(Actor::new(7, ActorRole::Rider)))
            .await;
        assert!(matches!(result, Err(FulfillmentError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_cancel_twice_is_noop_without_double_release() {
        // Already cancelled, reservation already released
        let (storage, variant_id) = fixture(OrderStatus::Cancelled, StockReservation::Released);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CancelOrderAction {
            order_id: "order-1".to_string(),
            reason: None,
        };
        let events = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await
            .unwrap();
        assert!(events.is_empty());

        // reserved untouched by the no-op
        let variant = ctx.variant(variant_id).unwrap();
        assert_eq!(variant.reserved, 3);
    }

    #[tokio::test]
    async fn test_cancel_after_release_is_rejected() {
        let (storage, _) = fixture(OrderStatus::ReleasedToRider, StockReservation::Held);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CancelOrderAction {
            order_id: "order-1".to_string(),
            reason: None,
        };
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidTransition {
                from: OrderStatus::ReleasedToRider,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cancel_delivered_is_rejected() {
        let (storage, _) = fixture(OrderStatus::Delivered, StockReservation::Committed);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = CancelOrderAction {
            order_id: "order-1".to_string(),
            reason: None,
        };
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidTransition { .. })
        ));
    }
}
