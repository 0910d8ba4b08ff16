//! Product Variant Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A purchasable SKU (product + size + color) with its stock ledger.
///
/// Invariant: `0 <= reserved <= on_hand` at all times;
/// `available = on_hand - reserved` never goes negative.
///
/// Variants are never hard-deleted while referenced by historical
/// orders; they are soft-archived instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub id: i64,
    /// Parent product reference
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Current list price
    pub price: Decimal,
    /// Units physically on hand
    pub on_hand: i64,
    /// Units held by unsettled reservations
    pub reserved: i64,
    /// Soft-archive flag; archived variants cannot be purchased
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: i64,
}

impl ProductVariant {
    pub fn new(
        product_id: i64,
        product_name: impl Into<String>,
        sku: impl Into<String>,
        price: Decimal,
        on_hand: i64,
    ) -> Self {
        Self {
            id: crate::util::snowflake_id(),
            product_id,
            product_name: product_name.into(),
            sku: sku.into(),
            size: None,
            color: None,
            price,
            on_hand,
            reserved: 0,
            is_archived: false,
            created_at: crate::util::now_millis(),
        }
    }

    /// Units available for new reservations
    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    /// Check the stock invariant
    pub fn is_consistent(&self) -> bool {
        self.reserved >= 0 && self.reserved <= self.on_hand
    }
}
