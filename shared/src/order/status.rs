//! Order and shipment status machines
//!
//! Both machines are defined once, here, and validated centrally. Order
//! transitions are strictly forward along the happy path:
//!
//! ```text
//! PENDING -> CONFIRMED -> [PROCESSING -> WAITING_FOR_PICKUP ->]
//!     RELEASED_TO_RIDER -> DELIVERED
//! ```
//!
//! with two explicit branches: `CANCELLED` (from PENDING or CONFIRMED)
//! and `RETURNED` (from DELIVERED). `PROCESSING` and
//! `WAITING_FOR_PICKUP` are optional packing stages; any forward hop
//! between CONFIRMED and RELEASED_TO_RIDER is legal, skipping backward
//! never is. No order re-enters PENDING after leaving it.
//!
//! Shipment status is a correlated but independently tracked machine.
//! It only moves forward; `DELIVERED`, `FAILED` and `RETURNED` are
//! terminal.

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, stock reserved, awaiting seller confirmation
    #[default]
    Pending,
    /// Seller confirmed
    Confirmed,
    /// Seller started packing (optional stage)
    Processing,
    /// Packed, awaiting rider handover (optional stage)
    WaitingForPickup,
    /// Handed to fulfillment; shipment exists
    ReleasedToRider,
    /// Delivered to the buyer; stock committed
    Delivered,
    /// Cancelled before fulfillment; reservation released
    Cancelled,
    /// Returned after delivery
    Returned,
}

impl OrderStatus {
    /// Position along the happy path; branch states have no rank.
    fn forward_rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::WaitingForPickup => Some(3),
            Self::ReleasedToRider => Some(4),
            Self::Delivered => Some(5),
            Self::Cancelled | Self::Returned => None,
        }
    }

    /// Whether `self -> to` is a legal transition.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        match (self, to) {
            // Branch: cancellation, only before packing starts
            (Self::Pending | Self::Confirmed, Self::Cancelled) => true,
            // Branch: return, only after delivery
            (Self::Delivered, Self::Returned) => true,
            // Delivery requires the order to be with a rider
            (Self::ReleasedToRider, Self::Delivered) => true,
            (_, Self::Delivered) => false,
            // Confirmation cannot be skipped
            (Self::Pending, Self::Confirmed) => true,
            (Self::Pending, _) => false,
            // Forward hops between CONFIRMED and RELEASED_TO_RIDER,
            // optional stages may be skipped
            (from, to) => match (from.forward_rank(), to.forward_rank()) {
                (Some(f), Some(t)) => f >= 1 && t <= 4 && t > f,
                _ => false,
            },
        }
    }

    /// Terminal states accept no further events.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned)
    }

    /// States from which cancellation is legal.
    pub fn is_cancellable(self) -> bool {
        self.can_transition(Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::WaitingForPickup => "WAITING_FOR_PICKUP",
            Self::ReleasedToRider => "RELEASED_TO_RIDER",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Returned => "RETURNED",
        };
        write!(f, "{}", s)
    }
}

/// Shipment delivery status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Created, possibly not yet assigned to a rider
    #[default]
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Failed,
    Returned,
}

impl ShipmentStatus {
    fn forward_rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::PickedUp => Some(1),
            Self::InTransit => Some(2),
            Self::OutForDelivery => Some(3),
            Self::Delivered => Some(4),
            Self::Failed | Self::Returned => None,
        }
    }

    /// Whether `self -> to` is a legal shipment transition.
    ///
    /// Riders may skip intermediate stages (a short hop can go straight
    /// from PICKED_UP to DELIVERED) but never move backward. DELIVERED
    /// admits exactly one further move, into RETURNED.
    pub fn can_transition(self, to: ShipmentStatus) -> bool {
        match to {
            Self::Returned => self == Self::Delivered,
            Self::Failed => !self.is_terminal(),
            _ => match (self.forward_rank(), to.forward_rank()) {
                (Some(f), Some(t)) => t > f,
                _ => false,
            },
        }
    }

    /// Terminal shipment states
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Returned)
    }

    /// Statuses counting toward a rider's active load
    pub const ACTIVE: [ShipmentStatus; 4] = [
        Self::Pending,
        Self::PickedUp,
        Self::InTransit,
        Self::OutForDelivery,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::PickedUp => "PICKED_UP",
            Self::InTransit => "IN_TRANSIT",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Failed => "FAILED",
            Self::Returned => "RETURNED",
        };
        write!(f, "{}", s)
    }
}
