//! AssignRider command handler
//!
//! Backlog retry: attempts rider assignment for a released order whose
//! shipment has no rider yet. Issued by the sweeper (SYSTEM actor) or
//! an administrator. Finding no rider is still success - the order
//! simply stays in the backlog.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::riders::{AssignmentPolicy, select_rider};
use shared::order::{ActorRole, EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// AssignRider action
#[derive(Debug, Clone)]
pub struct AssignRiderAction {
    pub order_id: String,
    pub policy: AssignmentPolicy,
}

#[async_trait]
impl CommandHandler for AssignRiderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        if !matches!(metadata.actor.role, ActorRole::System | ActorRole::Admin) {
            return Err(FulfillmentError::NotAuthorized(format!(
                "{} cannot trigger rider assignment",
                metadata.actor.role
            )));
        }

        let snapshot = ctx.load_snapshot(&self.order_id)?;
        if snapshot.status != OrderStatus::ReleasedToRider {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "ASSIGN_RIDER".to_string(),
            });
        }

        let mut shipment = ctx
            .shipment_for_order(&self.order_id)?
            .ok_or_else(|| {
                FulfillmentError::Validation(format!(
                    "released order {} has no shipment record",
                    self.order_id
                ))
            })?;

        // Must not double-assign
        if shipment.rider_id.is_some() {
            warn!(
                order_id = %self.order_id,
                shipment_id = shipment.id,
                "Shipment already assigned, skipping"
            );
            ctx.clear_unassigned(&self.order_id)?;
            return Ok(vec![]);
        }
        if shipment.status.is_terminal() {
            warn!(
                order_id = %self.order_id,
                shipment_id = shipment.id,
                status = %shipment.status,
                "Shipment is terminal, removing from backlog"
            );
            ctx.clear_unassigned(&self.order_id)?;
            return Ok(vec![]);
        }

        let Ok(mut rider) = select_rider(ctx.list_riders()?, &snapshot.address, &self.policy)
        else {
            // Still a backlog state; the next sweep retries.
            return Ok(vec![]);
        };

        shipment.rider_id = Some(rider.id);
        shipment.updated_at = shared::util::now_millis();
        rider.active_deliveries += 1;
        ctx.put_shipment(&shipment)?;
        ctx.put_rider(&rider)?;
        ctx.clear_unassigned(&self.order_id)?;

        info!(
            order_id = %self.order_id,
            shipment_id = shipment.id,
            rider_id = rider.id,
            "Backlog shipment assigned"
        );

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::RiderAssigned,
            EventPayload::RiderAssigned {
                shipment_id: shipment.id,
                rider_id: rider.id,
            },
        );

        Ok(vec![event])
    }
}
