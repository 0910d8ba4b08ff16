//! Shipping address snapshot

use serde::{Deserialize, Serialize};

/// Shipping address captured at checkout.
///
/// A snapshot, not a reference: later edits to the buyer's address book
/// never alter where a historical order was shipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AddressSnapshot {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub province: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl AddressSnapshot {
    /// Region used for rider service-area matching
    pub fn region(&self) -> &str {
        &self.city
    }
}
