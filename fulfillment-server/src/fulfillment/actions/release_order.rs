//! ReleaseToRider command handler
//!
//! Hands the order to fulfillment: creates the shipment record and
//! attempts rider assignment. An empty rider pool is a backlog state,
//! not a failure - the shipment stays unassigned and the sweeper
//! retries later.

use async_trait::async_trait;
use tracing::info;

use super::ensure_seller;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::riders::{AssignmentPolicy, select_rider};
use shared::models::Shipment;
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// ReleaseToRider action
#[derive(Debug, Clone)]
pub struct ReleaseOrderAction {
    pub order_id: String,
    pub policy: AssignmentPolicy,
}

#[async_trait]
impl CommandHandler for ReleaseOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_seller(&snapshot, &metadata.actor)?;

        if !snapshot.status.can_transition(OrderStatus::ReleasedToRider) {
            return Err(FulfillmentError::InvalidTransition {
                from: snapshot.status,
                event: "RELEASE_TO_RIDER".to_string(),
            });
        }

        let mut shipment = Shipment::new(self.order_id.clone());
        let mut events = Vec::with_capacity(2);

        let seq = ctx.next_sequence();
        events.push(OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderReleased,
            EventPayload::OrderReleased {
                shipment_id: shipment.id,
                tracking_number: shipment.tracking_number.clone(),
            },
        ));

        // Assignment attempt. Failure leaves the shipment unassigned
        // with rider_id = null and the order in the backlog index.
        match select_rider(ctx.list_riders()?, &snapshot.address, &self.policy) {
            Ok(mut rider) => {
                shipment.rider_id = Some(rider.id);
                rider.active_deliveries += 1;
                ctx.put_rider(&rider)?;

                let seq = ctx.next_sequence();
                events.push(OrderEvent::new(
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
                ));

                info!(
                    order_id = %self.order_id,
                    shipment_id = shipment.id,
                    rider_id = rider.id,
                    "Order released and rider assigned"
                );
            }
            Err(backlog) => {
                ctx.mark_unassigned(&self.order_id)?;
                info!(
                    order_id = %self.order_id,
                    shipment_id = shipment.id,
                    region = %backlog.region,
                    "Order released with no rider available, queued for retry"
                );
            }
        }

        ctx.put_shipment(&shipment)?;
        Ok(events)
    }
}
