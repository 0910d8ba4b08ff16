//! ConfirmOrder command handler

use async_trait::async_trait;

use super::ensure_seller;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// ConfirmOrder action - seller accepts a pending order
#[derive(Debug, Clone)]
pub struct ConfirmOrderAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for ConfirmOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_seller(&snapshot, &metadata.actor)?;

        if !snapshot.status.can_transition(OrderStatus::Confirmed) {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "CONFIRM_ORDER".to_string(),
            });
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderConfirmed,
            EventPayload::OrderConfirmed {},
        );

        Ok(vec![event])
    }
}
