//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one
//! specific command type: authorization, transition validation against
//! the central status tables, side effects inside the transaction, and
//! event generation.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::riders::AssignmentPolicy;
use shared::order::{
    Actor, ActorRole, FulfillmentCommand, FulfillmentCommandPayload, OrderEvent, OrderSnapshot,
};

mod assign_rider;
mod cancel_order;
mod confirm_order;
mod mark_delivered;
mod mark_failed;
mod mark_ready;
pub mod place_order;
mod release_order;
mod request_return;
mod shipment_progress;
mod start_processing;

pub use assign_rider::AssignRiderAction;
pub use cancel_order::CancelOrderAction;
pub use confirm_order::ConfirmOrderAction;
pub use mark_delivered::MarkDeliveredAction;
pub use mark_failed::MarkFailedAction;
pub use mark_ready::MarkReadyAction;
pub use place_order::PlaceOrderAction;
pub use release_order::ReleaseOrderAction;
pub use request_return::RequestReturnAction;
pub use shipment_progress::ShipmentProgressAction;
pub use start_processing::StartProcessingAction;

/// Ensure the actor may act as the order's seller
pub(crate) fn ensure_seller(
    snapshot: &OrderSnapshot,
    actor: &Actor,
) -> Result<(), FulfillmentError> {
    match actor.role {
        ActorRole::Admin => Ok(()),
        ActorRole::Seller if actor.id == snapshot.seller_id => Ok(()),
        ActorRole::Seller => Err(FulfillmentError::NotAuthorized(format!(
            "seller {} does not own order {}",
            actor.id, snapshot.order_id
        ))),
        role => Err(FulfillmentError::NotAuthorized(format!(
            "{role} cannot perform seller operations"
        ))),
    }
}

/// Ensure the actor may act as the order's buyer
pub(crate) fn ensure_buyer(
    snapshot: &OrderSnapshot,
    actor: &Actor,
) -> Result<(), FulfillmentError> {
    match actor.role {
        ActorRole::Admin => Ok(()),
        ActorRole::Buyer if actor.id == snapshot.buyer_id => Ok(()),
        ActorRole::Buyer => Err(FulfillmentError::NotAuthorized(format!(
            "buyer {} does not own order {}",
            actor.id, snapshot.order_id
        ))),
        role => Err(FulfillmentError::NotAuthorized(format!(
            "{role} cannot perform buyer operations"
        ))),
    }
}

/// Ensure the actor is the rider assigned to the shipment
pub(crate) fn ensure_assigned_rider(
    rider_id: Option<i64>,
    actor: &Actor,
) -> Result<(), FulfillmentError> {
    match actor.role {
        ActorRole::Admin => Ok(()),
        ActorRole::Rider if rider_id == Some(actor.id) => Ok(()),
        ActorRole::Rider => Err(FulfillmentError::NotAuthorized(
            "shipment is not assigned to this rider".to_string(),
        )),
        role => Err(FulfillmentError::NotAuthorized(format!(
            "{role} cannot perform rider operations"
        ))),
    }
}

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    PlaceOrder(PlaceOrderAction),
    ConfirmOrder(ConfirmOrderAction),
    StartProcessing(StartProcessingAction),
    MarkReady(MarkReadyAction),
    ReleaseOrder(ReleaseOrderAction),
    AssignRider(AssignRiderAction),
    ShipmentProgress(ShipmentProgressAction),
    MarkDelivered(MarkDeliveredAction),
    MarkFailed(MarkFailedAction),
    CancelOrder(CancelOrderAction),
    RequestReturn(RequestReturnAction),
}

/// Manual implementation of CommandHandler for CommandAction
#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        match self {
            CommandAction::PlaceOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::ConfirmOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::StartProcessing(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkReady(action) => action.execute(ctx, metadata).await,
            CommandAction::ReleaseOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::AssignRider(action) => action.execute(ctx, metadata).await,
            CommandAction::ShipmentProgress(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkDelivered(action) => action.execute(ctx, metadata).await,
            CommandAction::MarkFailed(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::RequestReturn(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert FulfillmentCommand to CommandAction.
///
/// This is the ONLY place with a match on FulfillmentCommandPayload.
/// The manager special-cases PlaceOrder (pre-generated order number)
/// and the assignment-bearing commands (policy injection); this
/// conversion covers the rest with the default policy.
impl From<&FulfillmentCommand> for CommandAction {
    fn from(cmd: &FulfillmentCommand) -> Self {
        match &cmd.payload {
            FulfillmentCommandPayload::PlaceOrder { .. } => {
                // PlaceOrder is handled by FulfillmentManager to inject the
                // pre-generated order number. This path should never be reached.
                unreachable!("PlaceOrder should be built by FulfillmentManager")
            }
            FulfillmentCommandPayload::ConfirmOrder { order_id } => {
                CommandAction::ConfirmOrder(ConfirmOrderAction {
                    order_id: order_id.clone(),
                })
            }
            FulfillmentCommandPayload::StartProcessing { order_id } => {
                CommandAction::StartProcessing(StartProcessingAction {
                    order_id: order_id.clone(),
                })
            }
            FulfillmentCommandPayload::MarkReadyForPickup { order_id } => {
                CommandAction::MarkReady(MarkReadyAction {
                    order_id: order_id.clone(),
                })
            }
            FulfillmentCommandPayload::ReleaseToRider { order_id } => {
                CommandAction::ReleaseOrder(ReleaseOrderAction {
                    order_id: order_id.clone(),
                    policy: AssignmentPolicy::default(),
                })
            }
            FulfillmentCommandPayload::AssignRider { order_id } => {
                CommandAction::AssignRider(AssignRiderAction {
                    order_id: order_id.clone(),
                    policy: AssignmentPolicy::default(),
                })
            }
            FulfillmentCommandPayload::UpdateShipmentProgress {
                shipment_id,
                status,
            } => CommandAction::ShipmentProgress(ShipmentProgressAction {
                shipment_id: *shipment_id,
                status: *status,
            }),
            FulfillmentCommandPayload::MarkDelivered { shipment_id } => {
                CommandAction::MarkDelivered(MarkDeliveredAction {
                    shipment_id: *shipment_id,
                })
            }
            FulfillmentCommandPayload::MarkDeliveryFailed {
                shipment_id,
                reason,
            } => CommandAction::MarkFailed(MarkFailedAction {
                shipment_id: *shipment_id,
                reason: reason.clone(),
            }),
            FulfillmentCommandPayload::CancelOrder { order_id, reason } => {
                CommandAction::CancelOrder(CancelOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            FulfillmentCommandPayload::RequestReturn { order_id, reason } => {
                CommandAction::RequestReturn(RequestReturnAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
        }
    }
}
