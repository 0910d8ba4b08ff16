//! Standardized error codes
//!
//! Codes are stable: they are part of the API contract and must not be
//! renumbered. Ranges are reserved per domain (see module docs in
//! [`super`]).

use super::category::ErrorCategory;
use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Standardized error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== General (0xxx) ====================
    /// Unknown error
    Unknown = 1,
    /// Resource not found
    NotFound = 2,
    /// Resource already exists
    AlreadyExists = 3,
    /// Invalid request
    InvalidRequest = 4,

    // ==================== Validation / Auth (1xxx) ====================
    /// Request validation failed
    ValidationFailed = 1001,
    /// Actor lacks permission for the requested operation
    NotAuthorized = 1002,

    // ==================== Order / Fulfillment (4xxx) ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested event is not legal for the order's current status
    InvalidTransition = 4002,
    /// Command was already processed (idempotent replay)
    DuplicateCommand = 4003,

    // ==================== Inventory (5xxx) ====================
    /// Not enough available stock to reserve
    InsufficientStock = 5001,
    /// Product variant not found
    VariantNotFound = 5002,
    /// Product variant is archived and cannot be purchased
    VariantArchived = 5003,

    // ==================== Rider / Shipment (6xxx) ====================
    /// Shipment not found
    ShipmentNotFound = 6001,
    /// Rider not found
    RiderNotFound = 6002,
    /// No eligible rider for assignment (backlog condition)
    NoRiderAvailable = 6003,

    // ==================== System (9xxx) ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage/database error
    DatabaseError = 9002,
    /// System busy, retry later (lock/transaction timeout)
    SystemBusy = 9003,
    /// Storage device is full
    StorageFull = 9401,
    /// Out of memory
    OutOfMemory = 9402,
    /// Storage corruption detected
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Numeric code (stable API contract)
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Default human-readable message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown error",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::ValidationFailed => "Validation failed",
            Self::NotAuthorized => "Not authorized for this operation",
            Self::OrderNotFound => "Order not found",
            Self::InvalidTransition => "Order state changed, please refresh",
            Self::DuplicateCommand => "Command already processed",
            Self::InsufficientStock => "Insufficient stock",
            Self::VariantNotFound => "Product variant not found",
            Self::VariantArchived => "Product variant is no longer available",
            Self::ShipmentNotFound => "Shipment not found",
            Self::RiderNotFound => "Rider not found",
            Self::NoRiderAvailable => "No rider available",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::SystemBusy => "System busy, please try again",
            Self::StorageFull => "Storage full",
            Self::OutOfMemory => "Out of memory",
            Self::StorageCorrupted => "Storage corrupted",
        }
    }

    /// Category for this code
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            0..=999 => ErrorCategory::General,
            1000..=1999 => ErrorCategory::Auth,
            4000..=4999 => ErrorCategory::Order,
            5000..=5999 => ErrorCategory::Inventory,
            6000..=6999 => ErrorCategory::Shipment,
            _ => ErrorCategory::System,
        }
    }

    /// HTTP status code for API responses
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound | Self::OrderNotFound | Self::VariantNotFound | Self::RiderNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::ShipmentNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::InvalidRequest | Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::InvalidTransition | Self::DuplicateCommand => StatusCode::CONFLICT,
            Self::InsufficientStock | Self::VariantArchived => StatusCode::UNPROCESSABLE_ENTITY,
            // Backlog condition, not a caller-visible failure
            Self::NoRiderAvailable => StatusCode::ACCEPTED,
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError
            | Self::DatabaseError
            | Self::StorageFull
            | Self::OutOfMemory
            | Self::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Error returned when converting an unknown numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl std::fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            1 => Self::Unknown,
            2 => Self::NotFound,
            3 => Self::AlreadyExists,
            4 => Self::InvalidRequest,
            1001 => Self::ValidationFailed,
            1002 => Self::NotAuthorized,
            4001 => Self::OrderNotFound,
            4002 => Self::InvalidTransition,
            4003 => Self::DuplicateCommand,
            5001 => Self::InsufficientStock,
            5002 => Self::VariantNotFound,
            5003 => Self::VariantArchived,
            6001 => Self::ShipmentNotFound,
            6002 => Self::RiderNotFound,
            6003 => Self::NoRiderAvailable,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::SystemBusy,
            9401 => Self::StorageFull,
            9402 => Self::OutOfMemory,
            9403 => Self::StorageCorrupted,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::ValidationFailed,
            ErrorCode::OrderNotFound,
            ErrorCode::InvalidTransition,
            ErrorCode::InsufficientStock,
            ErrorCode::ShipmentNotFound,
            ErrorCode::SystemBusy,
            ErrorCode::StorageCorrupted,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::OrderNotFound.category(), ErrorCategory::Order);
        assert_eq!(
            ErrorCode::InsufficientStock.category(),
            ErrorCategory::Inventory
        );
        assert_eq!(ErrorCode::ShipmentNotFound.category(), ErrorCategory::Shipment);
        assert_eq!(ErrorCode::SystemBusy.category(), ErrorCategory::System);
        assert_eq!(ErrorCode::NotAuthorized.category(), ErrorCategory::Auth);
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::InvalidTransition.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::InsufficientStock.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::SystemBusy.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_display_format() {
        assert_eq!(ErrorCode::OrderNotFound.to_string(), "E4001");
        assert_eq!(ErrorCode::NotFound.to_string(), "E0002");
    }
}
