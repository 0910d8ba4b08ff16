//! Shipment Model

use crate::order::status::ShipmentStatus;
use serde::{Deserialize, Serialize};

/// One delivery record, 1:1 with an order.
///
/// `rider_id` stays None until assignment succeeds; an unassigned
/// shipment is a valid backlog state, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shipment {
    pub id: i64,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<i64>,
    /// Globally unique, generated at creation
    pub tracking_number: String,
    pub status: ShipmentStatus,
    /// Set when the rider picks up the parcel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Shipment {
    pub fn new(order_id: impl Into<String>) -> Self {
        let id = crate::util::snowflake_id();
        let now = crate::util::now_millis();
        Self {
            id,
            order_id: order_id.into(),
            rider_id: None,
            tracking_number: format!("TRK-{id:013}"),
            status: ShipmentStatus::Pending,
            shipped_at: None,
            delivered_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
