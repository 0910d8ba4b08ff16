//! MarkDeliveryFailed command handler
//!
//! A failed attempt is terminal for the shipment record. The order
//! remains RELEASED_TO_RIDER and the rider's load is freed; recovery
//! (re-shipment) is an operator decision, not automatic.

use async_trait::async_trait;
use tracing::info;

use super::ensure_assigned_rider;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, ShipmentStatus};

/// MarkDeliveryFailed action
#[derive(Debug, Clone)]
pub struct MarkFailedAction {
    pub shipment_id: i64,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for MarkFailedAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let mut shipment = ctx.shipment_by_id(self.shipment_id)?;
        ensure_assigned_rider(shipment.rider_id, &metadata.actor)?;

        if !shipment.status.can_transition(ShipmentStatus::Failed) {
            return Err(FulfillmentError::ShipmentTransition {
                from: shipment.status,
                to: ShipmentStatus::Failed,
            });
        }

        shipment.status = ShipmentStatus::Failed;
        shipment.failure_reason = self.reason.clone();
        shipment.updated_at = shared::util::now_millis();
        ctx.put_shipment(&shipment)?;

        if let Some(rider_id) = shipment.rider_id {
            let mut rider = ctx.rider(rider_id)?;
            rider.active_deliveries = rider.active_deliveries.saturating_sub(1);
            ctx.put_rider(&rider)?;
        }

        info!(
            order_id = %shipment.order_id,
            shipment_id = shipment.id,
            reason = ?self.reason,
            "Delivery failed"
        );

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            shipment.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::DeliveryFailed,
            EventPayload::DeliveryFailed {
                shipment_id: shipment.id,
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}
