//! Persistent domain models

pub mod address;
pub mod rider;
pub mod shipment;
pub mod variant;

pub use address::AddressSnapshot;
pub use rider::{Rider, RiderStatus, VehicleType};
pub use shipment::Shipment;
pub use variant::ProductVariant;
