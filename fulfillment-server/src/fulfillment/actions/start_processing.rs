//! StartProcessing command handler
//!
//! Optional packing stage for sellers who batch-pack orders.

use async_trait::async_trait;

use super::ensure_seller;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// StartProcessing action
#[derive(Debug, Clone)]
pub struct StartProcessingAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for StartProcessingAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_seller(&snapshot, &metadata.actor)?;

        if !snapshot.status.can_transition(OrderStatus::Processing) {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "START_PROCESSING".to_string(),
            });
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::PackingStarted,
            EventPayload::PackingStarted {},
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
    async fn test_processing_from_confirmed() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        seed_order(&storage, OrderStatus::Confirmed);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = StartProcessingAction {
            order_id: "order-1".to_string(),
        };
        let events = action.execute(&mut ctx, &metadata()).await.unwrap();
        assert_eq!(events[0].event_type, OrderEventType::PackingStarted);
    }

    #[tokio::test]
    async fn test_processing_needs_confirmation_first() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        seed_order(&storage, OrderStatus::Pending);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = StartProcessingAction {
            order_id: "order-1".to_string(),
        };
        let result = action.execute(&mut ctx, &metadata()).await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidTransition {
                from: OrderStatus::Pending,
                ..
            })
        ));
    }
}
