//! UpdateShipmentProgress command handler
//!
//! Rider advances the shipment through its intermediate stages
//! (picked up, in transit, out for delivery). Delivery, failure and
//! return have dedicated commands; the order status is untouched here.

use async_trait::async_trait;

use super::ensure_assigned_rider;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::order::{EventPayload, OrderEvent, OrderEventType, ShipmentStatus};

/// UpdateShipmentProgress action
#[derive(Debug, Clone)]
pub struct ShipmentProgressAction {
    pub shipment_id: i64,
    pub status: ShipmentStatus,
}

#[async_trait]
impl CommandHandler for ShipmentProgressAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        if !matches!(
            self.status,
            ShipmentStatus::PickedUp | ShipmentStatus::InTransit | ShipmentStatus::OutForDelivery
        ) {
            return Err(FulfillmentError::Validation(format!(
                "{} is not a progress stage; use the dedicated delivered/failed commands",
                self.status
            )));
        }

        let mut shipment = ctx.shipment_by_id(self.shipment_id)?;
        ensure_assigned_rider(shipment.rider_id, &metadata.actor)?;

        let from = shipment.status;
        if !from.can_transition(self.status) {
            return Err(FulfillmentError::ShipmentTransition {
                from,
                to: self.status,
            });
        }

        shipment.status = self.status;
        shipment.updated_at = shared::util::now_millis();
        if self.status == ShipmentStatus::PickedUp {
            shipment.shipped_at = Some(shipment.updated_at);
        }
        ctx.put_shipment(&shipment)?;

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            shipment.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::ShipmentProgressed,
            EventPayload::ShipmentProgressed {
                shipment_id: shipment.id,
                from,
                to: self.status,
            },
        );

        Ok(vec![event])
    }
}
