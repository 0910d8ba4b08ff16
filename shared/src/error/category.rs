//! Error category classification

use serde::{Deserialize, Serialize};

/// Classification of errors by domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// General errors (not found, already exists, invalid request)
    General,
    /// Request validation and authorization errors
    Auth,
    /// Order lifecycle and fulfillment errors
    Order,
    /// Inventory and stock errors
    Inventory,
    /// Rider and shipment errors
    Shipment,
    /// System errors (storage, internal)
    System,
}

impl ErrorCategory {
    /// Human-readable category name
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Order => "order",
            Self::Inventory => "inventory",
            Self::Shipment => "shipment",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
