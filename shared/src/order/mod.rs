//! Fulfillment commands, events, snapshots and status machines

pub mod command;
pub mod event;
pub mod snapshot;
pub mod status;

pub use command::{
    Actor, ActorRole, CommandError, CommandErrorCode, CommandResponse, FulfillmentCommand,
    FulfillmentCommandPayload, LineItemInput,
};
pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use snapshot::{LineItemSnapshot, OrderSnapshot, OrderTotals, StockReservation};
pub use status::{OrderStatus, ShipmentStatus};
