//! MarkReadyForPickup command handler
//!
//! Optional stage: packing finished, parcel waiting for rider handover.

use async_trait::async_trait;

use super::ensure_seller;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// MarkReadyForPickup action
#[derive(Debug, Clone)]
pub struct MarkReadyAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for MarkReadyAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_seller(&snapshot, &metadata.actor)?;

        if !snapshot.status.can_transition(OrderStatus::WaitingForPickup) {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "MARK_READY_FOR_PICKUP".to_string(),
            });
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::ReadyForPickup,
            EventPayload::ReadyForPickup {},
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::storage::FulfillmentStorage;
    use shared::order::{Actor, ActorRole, OrderSnapshot};

    fn metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "cmd-1".to_string(),
            actor: Actor::new(2, ActorRole::Seller),
            timestamp: 1234567890,
        }
    }

    fn seed_order(storage: &FulfillmentStorage, status: OrderStatus) {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.seller_id = 2;
        snapshot.status = status;
        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, &snapshot).unwrap();
        txn.commit().unwrap();
    }

    #[tokio::test]
    async fn test_ready_from_confirmed_skipping_processing() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        seed_order(&storage, OrderStatus::Confirmed);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = MarkReadyAction {
            order_id: "order-1".to_string(),
        };
        let events = action.execute(&mut ctx, &metadata()).await.unwrap();
        assert_eq!(events[0].event_type, OrderEventType::ReadyForPickup);
    }

    #[tokio::test]
    async fn test_ready_after_release_is_rejected() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        seed_order(&storage, OrderStatus::ReleasedToRider);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = MarkReadyAction {
            order_id: "order-1".to_string(),
        };
        let result = action.execute(&mut ctx, &metadata()).await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidTransition { .. })
        ));
    }
}
