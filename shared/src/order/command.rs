//! Fulfillment commands - requested operations, validated before events
//!
//! Every engine entry point is a command carrying an explicit [`Actor`].
//! Authorization happens at this boundary; business logic never consults
//! ambient session state.

use super::status::ShipmentStatus;
use crate::models::AddressSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who is performing an operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: i64, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// The engine itself (sweeper, maintenance) acting on orders
    pub fn system() -> Self {
        Self {
            id: 0,
            role: ActorRole::System,
        }
    }
}

/// Role of the acting party
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Buyer,
    Seller,
    Rider,
    Admin,
    /// Internal automation (reservation expiry, backlog retry)
    System,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Buyer => "BUYER",
            Self::Seller => "SELLER",
            Self::Rider => "RIDER",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
        };
        write!(f, "{}", s)
    }
}

/// One requested line item at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemInput {
    pub variant_id: i64,
    pub quantity: i32,
    /// Price the buyer saw at checkout; snapshotted into the order
    pub unit_price: Decimal,
}

/// Fulfillment command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentCommand {
    /// Unique command ID (idempotency key)
    pub command_id: String,
    /// Acting party
    pub actor: Actor,
    /// Client timestamp (Unix milliseconds) - for audit, may have clock skew
    pub timestamp: i64,
    /// Requested operation
    pub payload: FulfillmentCommandPayload,
}

impl FulfillmentCommand {
    pub fn new(actor: Actor, payload: FulfillmentCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Create with an explicit command ID (client-supplied idempotency key)
    pub fn with_id(
        command_id: impl Into<String>,
        actor: Actor,
        payload: FulfillmentCommandPayload,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            actor,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentCommandPayload {
    /// Checkout: create an order and reserve stock for every line item
    PlaceOrder {
        buyer_id: i64,
        seller_id: i64,
        address: AddressSnapshot,
        items: Vec<LineItemInput>,
        #[serde(default)]
        shipping_fee: Decimal,
        #[serde(default)]
        tax: Decimal,
        #[serde(default)]
        discount: Decimal,
    },

    /// Seller accepts the order
    ConfirmOrder { order_id: String },

    /// Seller starts packing (optional stage)
    StartProcessing { order_id: String },

    /// Seller finished packing, awaiting rider handover (optional stage)
    MarkReadyForPickup { order_id: String },

    /// Seller hands the order to fulfillment: creates the shipment and
    /// attempts rider assignment
    ReleaseToRider { order_id: String },

    /// Retry rider assignment for a backlog shipment (sweeper/admin)
    AssignRider { order_id: String },

    /// Rider advances the shipment (picked up, in transit, out for delivery)
    UpdateShipmentProgress {
        shipment_id: i64,
        status: ShipmentStatus,
    },

    /// Rider completes delivery: commits stock, finishes both machines
    MarkDelivered { shipment_id: i64 },

    /// Rider reports a failed delivery attempt
    MarkDeliveryFailed {
        shipment_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Buyer or seller cancels before fulfillment; releases reservations
    CancelOrder {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Buyer requests a return of a delivered order
    RequestReturn {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl FulfillmentCommandPayload {
    /// Order targeted by this command, when known up front.
    /// Shipment-keyed commands resolve their order inside the engine.
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::PlaceOrder { .. }
            | Self::UpdateShipmentProgress { .. }
            | Self::MarkDelivered { .. }
            | Self::MarkDeliveryFailed { .. } => None,
            Self::ConfirmOrder { order_id }
            | Self::StartProcessing { order_id }
            | Self::MarkReadyForPickup { order_id }
            | Self::ReleaseToRider { order_id }
            | Self::AssignRider { order_id }
            | Self::CancelOrder { order_id, .. }
            | Self::RequestReturn { order_id, .. } => Some(order_id),
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlaceOrder { .. } => "PLACE_ORDER",
            Self::ConfirmOrder { .. } => "CONFIRM_ORDER",
            Self::StartProcessing { .. } => "START_PROCESSING",
            Self::MarkReadyForPickup { .. } => "MARK_READY_FOR_PICKUP",
            Self::ReleaseToRider { .. } => "RELEASE_TO_RIDER",
            Self::AssignRider { .. } => "ASSIGN_RIDER",
            Self::UpdateShipmentProgress { .. } => "UPDATE_SHIPMENT_PROGRESS",
            Self::MarkDelivered { .. } => "MARK_DELIVERED",
            Self::MarkDeliveryFailed { .. } => "MARK_DELIVERY_FAILED",
            Self::CancelOrder { .. } => "CANCEL_ORDER",
            Self::RequestReturn { .. } => "REQUEST_RETURN",
        }
    }
}

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Affected order ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Order number (only for PlaceOrder)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    /// Resulting order status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<super::status::OrderStatus>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            order_number: None,
            status: None,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            order_number: None,
            status: None,
            error: Some(error),
        }
    }

    /// Response for an already-processed command (idempotent replay)
    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            order_id: None,
            order_number: None,
            status: None,
            error: None,
        }
    }

    pub fn with_order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }

    pub fn with_status(mut self, status: super::status::OrderStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    OrderNotFound,
    VariantNotFound,
    VariantArchived,
    ShipmentNotFound,
    RiderNotFound,
    InsufficientStock,
    InvalidTransition,
    NotAuthorized,
    ValidationFailed,
    InternalError,
    // Storage errors (map to ErrorCode 94xx)
    StorageFull,
    OutOfMemory,
    StorageCorrupted,
    SystemBusy,
}

impl CommandErrorCode {
    /// Map to the API-level [`crate::error::ErrorCode`]
    pub fn error_code(&self) -> crate::error::ErrorCode {
        use crate::error::ErrorCode as E;
        match self {
            Self::OrderNotFound => E::OrderNotFound,
            Self::VariantNotFound => E::VariantNotFound,
            Self::VariantArchived => E::VariantArchived,
            Self::ShipmentNotFound => E::ShipmentNotFound,
            Self::RiderNotFound => E::RiderNotFound,
            Self::InsufficientStock => E::InsufficientStock,
            Self::InvalidTransition => E::InvalidTransition,
            Self::NotAuthorized => E::NotAuthorized,
            Self::ValidationFailed => E::ValidationFailed,
            Self::InternalError => E::InternalError,
            Self::StorageFull => E::StorageFull,
            Self::OutOfMemory => E::OutOfMemory,
            Self::StorageCorrupted => E::StorageCorrupted,
            Self::SystemBusy => E::SystemBusy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_ids_are_unique() {
        let a = FulfillmentCommand::new(
            Actor::new(1, ActorRole::Seller),
            FulfillmentCommandPayload::ConfirmOrder {
                order_id: "o-1".to_string(),
            },
        );
        let b = FulfillmentCommand::new(
            Actor::new(1, ActorRole::Seller),
            FulfillmentCommandPayload::ConfirmOrder {
                order_id: "o-1".to_string(),
            },
        );
        assert_ne!(a.command_id, b.command_id);
    }

    #[test]
    fn test_order_id_hint() {
        let payload = FulfillmentCommandPayload::CancelOrder {
            order_id: "o-9".to_string(),
            reason: None,
        };
        assert_eq!(payload.order_id(), Some("o-9"));

        let payload = FulfillmentCommandPayload::MarkDelivered { shipment_id: 3 };
        assert_eq!(payload.order_id(), None);
    }

    #[test]
    fn test_payload_wire_format() {
        let payload = FulfillmentCommandPayload::ConfirmOrder {
            order_id: "o-1".to_string(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"type\":\"CONFIRM_ORDER\""));
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            CommandErrorCode::InsufficientStock.error_code(),
            crate::error::ErrorCode::InsufficientStock
        );
        assert_eq!(
            CommandErrorCode::SystemBusy.error_code(),
            crate::error::ErrorCode::SystemBusy
        );
    }
}
