//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles one
//! specific event type. Appliers are PURE functions: replaying an
//! order's event stream through them reproduces its snapshot exactly.

use enum_dispatch::enum_dispatch;

use crate::fulfillment::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

mod delivery_failed;
mod order_cancelled;
mod order_confirmed;
mod order_delivered;
mod order_placed;
mod order_released;
mod order_returned;
mod packing_started;
mod ready_for_pickup;
mod rider_assigned;
mod shipment_progressed;

pub use delivery_failed::DeliveryFailedApplier;
pub use order_cancelled::OrderCancelledApplier;
pub use order_confirmed::OrderConfirmedApplier;
pub use order_delivered::OrderDeliveredApplier;
pub use order_placed::OrderPlacedApplier;
pub use order_released::OrderReleasedApplier;
pub use order_returned::OrderReturnedApplier;
pub use packing_started::PackingStartedApplier;
pub use ready_for_pickup::ReadyForPickupApplier;
pub use rider_assigned::RiderAssignedApplier;
pub use shipment_progressed::ShipmentProgressedApplier;

/// Common bookkeeping every applier performs
pub(crate) fn touch(snapshot: &mut OrderSnapshot, event: &OrderEvent) {
    snapshot.last_sequence = event.sequence;
    snapshot.updated_at = event.timestamp;
}

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderPlaced(OrderPlacedApplier),
    OrderConfirmed(OrderConfirmedApplier),
    PackingStarted(PackingStartedApplier),
    ReadyForPickup(ReadyForPickupApplier),
    OrderReleased(OrderReleasedApplier),
    RiderAssigned(RiderAssignedApplier),
    ShipmentProgressed(ShipmentProgressedApplier),
    OrderDelivered(OrderDeliveredApplier),
    DeliveryFailed(DeliveryFailedApplier),
    OrderCancelled(OrderCancelledApplier),
    OrderReturned(OrderReturnedApplier),
}

/// Convert OrderEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderPlaced { .. } => EventAction::OrderPlaced(OrderPlacedApplier),
            EventPayload::OrderConfirmed { .. } => {
                EventAction::OrderConfirmed(OrderConfirmedApplier)
            }
            EventPayload::PackingStarted { .. } => {
                EventAction::PackingStarted(PackingStartedApplier)
            }
            EventPayload::ReadyForPickup { .. } => {
                EventAction::ReadyForPickup(ReadyForPickupApplier)
            }
            EventPayload::OrderReleased { .. } => EventAction::OrderReleased(OrderReleasedApplier),
            EventPayload::RiderAssigned { .. } => EventAction::RiderAssigned(RiderAssignedApplier),
            EventPayload::ShipmentProgressed { .. } => {
                EventAction::ShipmentProgressed(ShipmentProgressedApplier)
            }
            EventPayload::OrderDelivered { .. } => {
                EventAction::OrderDelivered(OrderDeliveredApplier)
            }
            EventPayload::DeliveryFailed { .. } => {
                EventAction::DeliveryFailed(DeliveryFailedApplier)
            }
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            EventPayload::OrderReturned { .. } => {
                EventAction::OrderReturned(OrderReturnedApplier)
            }
        }
    }
}
