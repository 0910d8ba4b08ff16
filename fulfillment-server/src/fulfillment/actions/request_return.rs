//! RequestReturn command handler
//!
//! Buyer-initiated return of a delivered order. The stock commit is not
//! reversed (returned goods re-enter inventory through inspection, not
//! automatically) and financial reversal happens outside the engine.

use async_trait::async_trait;
use tracing::info;

use super::ensure_buyer;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus, ShipmentStatus};

/// RequestReturn action
#[derive(Debug, Clone)]
pub struct RequestReturnAction {
    pub order_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for RequestReturnAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_buyer(&snapshot, &metadata.actor)?;

        if !snapshot.status.can_transition(OrderStatus::Returned) {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "REQUEST_RETURN".to_string(),
            });
        }

        // Close out the shipment record alongside the order
        if let Some(mut shipment) = ctx.shipment_for_order(&self.order_id)?
            && shipment.status.can_transition(ShipmentStatus::Returned)
        {
            shipment.status = ShipmentStatus::Returned;
            shipment.updated_at = shared::util::now_millis();
            ctx.put_shipment(&shipment)?;
        }

        info!(
            order_id = %self.order_id,
            reason = ?self.reason,
            "Return requested"
        );

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderReturned,
            EventPayload::OrderReturned {
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::storage::FulfillmentStorage;
    use shared::models::Shipment;
    use shared::order::{Actor, ActorRole, OrderSnapshot};

    fn metadata(actor: Actor) -> CommandMetadata {
        CommandMetadata {
            command_id: "cmd-1".to_string(),
            actor,
            timestamp: 1234567890,
        }
    }

    fn seed(storage: &FulfillmentStorage, status: OrderStatus) {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.buyer_id = 1;
        snapshot.status = status;

        let mut shipment = Shipment::new("order-1");
        shipment.status = ShipmentStatus::Delivered;
        snapshot.shipment_id = Some(shipment.id);

        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &snapshot).unwrap();
        storage.put_shipment(&txn, &shipment).unwrap();
        txn.commit().unwrap();
    }

    #[tokio::test]
    async fn test_return_delivered_order() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        seed(&storage, OrderStatus::Delivered);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = RequestReturnAction {
            order_id: "order-1".to_string(),
            reason: Some("wrong size".to_string()),
        };
        let events = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await
            .unwrap();

        assert_eq!(events[0].event_type, OrderEventType::OrderReturned);
        let shipment = ctx.shipment_for_order("order-1").unwrap().unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Returned);
    }

    #[tokio::test]
    async fn test_return_before_delivery_rejected() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        seed(&storage, OrderStatus::ReleasedToRider);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = RequestReturnAction {
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

    #[tokio::test]
    async fn test_only_buyer_requests_return() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        seed(&storage, OrderStatus::Delivered);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = RequestReturnAction {
            order_id: "order-1".to_string(),
            reason: None,
        };
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(2, ActorRole::Seller)))
            .await;
        assert!(matches!(result, Err(FulfillmentError::NotAuthorized(_))));
    }
}
