//! Order events - immutable facts recorded after command processing

use super::command::{Actor, ActorRole, FulfillmentCommand};
use super::snapshot::{LineItemSnapshot, OrderTotals};
use super::status::ShipmentStatus;
use crate::models::AddressSnapshot;
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    /// This is the AUTHORITATIVE ordering mechanism for state evolution
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds) - AUTHORITATIVE for state evolution
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds) - for audit and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Actor who triggered this event
    pub actor: Actor,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    /// Event type
    pub event_type: OrderEventType,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    // Lifecycle
    OrderPlaced,
    OrderConfirmed,
    PackingStarted,
    ReadyForPickup,
    OrderReleased,
    OrderDelivered,
    OrderCancelled,
    OrderReturned,

    // Shipment
    RiderAssigned,
    ShipmentProgressed,
    DeliveryFailed,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrderPlaced => "ORDER_PLACED",
            Self::OrderConfirmed => "ORDER_CONFIRMED",
            Self::PackingStarted => "PACKING_STARTED",
            Self::ReadyForPickup => "READY_FOR_PICKUP",
            Self::OrderReleased => "ORDER_RELEASED",
            Self::OrderDelivered => "ORDER_DELIVERED",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::OrderReturned => "ORDER_RETURNED",
            Self::RiderAssigned => "RIDER_ASSIGNED",
            Self::ShipmentProgressed => "SHIPMENT_PROGRESSED",
            Self::DeliveryFailed => "DELIVERY_FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    OrderPlaced {
        /// Server-generated order number (immutable once assigned)
        order_number: String,
        buyer_id: i64,
        seller_id: i64,
        /// Shipping address captured at checkout
        address: AddressSnapshot,
        /// Complete line-item snapshots (decoupled from live variants)
        items: Vec<LineItemSnapshot>,
        totals: OrderTotals,
    },

    OrderConfirmed {},

    PackingStarted {},

    ReadyForPickup {},

    OrderReleased {
        shipment_id: i64,
        tracking_number: String,
    },

    OrderDelivered {
        shipment_id: i64,
    },

    OrderCancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        cancelled_by: ActorRole,
    },

    OrderReturned {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Shipment ==========
    RiderAssigned {
        shipment_id: i64,
        rider_id: i64,
    },

    ShipmentProgressed {
        shipment_id: i64,
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    DeliveryFailed {
        shipment_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl OrderEvent {
    /// Create a new event
    ///
    /// # Arguments
    /// * `sequence` - Global sequence number (authoritative ordering)
    /// * `order_id` - Order this event belongs to
    /// * `actor` - Actor who triggered this event
    /// * `command_id` - Command that triggered this event
    /// * `client_timestamp` - Client-provided timestamp (for audit, may have clock skew)
    /// * `event_type` - Event type
    /// * `payload` - Event payload
    pub fn new(
        sequence: u64,
        order_id: String,
        actor: Actor,
        command_id: String,
        client_timestamp: Option<i64>,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            // Server timestamp is ALWAYS set by the server - authoritative
            timestamp: crate::util::now_millis(),
            client_timestamp,
            actor,
            command_id,
            event_type,
            payload,
        }
    }

    /// Create event from command (extracts metadata including client timestamp)
    pub fn from_command(
        sequence: u64,
        order_id: String,
        command: &FulfillmentCommand,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self::new(
            sequence,
            order_id,
            command.actor,
            command.command_id.clone(),
            Some(command.timestamp),
            event_type,
            payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_has_server_timestamp() {
        let before = crate::util::now_millis();
        let event = OrderEvent::new(
            1,
            "o-1".to_string(),
            Actor::new(7, ActorRole::Seller),
            "cmd-1".to_string(),
            Some(123),
            OrderEventType::OrderConfirmed,
            EventPayload::OrderConfirmed {},
        );
        assert!(event.timestamp >= before);
        assert_eq!(event.client_timestamp, Some(123));
        assert_eq!(event.sequence, 1);
    }

    #[test]
    fn test_payload_wire_format() {
        let payload = EventPayload::RiderAssigned {
            shipment_id: 5,
            rider_id: 9,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"type\":\"RIDER_ASSIGNED\""));
    }
}
