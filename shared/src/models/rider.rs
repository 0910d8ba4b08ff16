//! Rider Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rider account status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiderStatus {
    #[default]
    Pending,
    Approved,
    Active,
    Inactive,
    Suspended,
}

impl RiderStatus {
    /// Statuses eligible for assignment
    pub fn is_assignable(self) -> bool {
        matches!(self, Self::Active | Self::Approved)
    }
}

/// Vehicle type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    #[default]
    Motorcycle,
    Bicycle,
    Car,
    Van,
    Truck,
}

/// A fulfillment agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rider {
    pub id: i64,
    pub name: String,
    pub vehicle_type: VehicleType,
    /// Service area (city or province); None means unrestricted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_area: Option<String>,
    pub is_available: bool,
    pub status: RiderStatus,
    /// Historical rating, 0.00 - 5.00
    pub rating: Decimal,
    /// Currently active shipments (derived counter, used for load balancing)
    pub active_deliveries: u32,
    /// Lifetime completed deliveries
    pub total_deliveries: u64,
    pub created_at: i64,
}

impl Rider {
    pub fn new(name: impl Into<String>, vehicle_type: VehicleType) -> Self {
        Self {
            id: crate::util::snowflake_id(),
            name: name.into(),
            vehicle_type,
            service_area: None,
            is_available: true,
            status: RiderStatus::Pending,
            rating: Decimal::ZERO,
            active_deliveries: 0,
            total_deliveries: 0,
            created_at: crate::util::now_millis(),
        }
    }

    /// Whether this rider serves the given region.
    ///
    /// An unrestricted rider (no service area) serves everywhere;
    /// otherwise matching is case-insensitive.
    pub fn serves(&self, region: &str) -> bool {
        match &self.service_area {
            None => true,
            Some(area) => area.eq_ignore_ascii_case(region),
        }
    }
}
