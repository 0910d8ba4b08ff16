//! Stock reservation ledger
//!
//! Tracks available/reserved stock per product variant. All operations
//! run inside the caller's write transaction, so a multi-line checkout
//! reserves everything or nothing: any failure aborts the transaction
//! and no partial reservation persists.
//!
//! Invariant maintained throughout: `0 <= reserved <= on_hand`.
//!
//! Multi-item operations acquire variants in ascending id order so
//! concurrent cross-entity operations always touch rows in the same
//! order.

use shared::models::ProductVariant;

use crate::fulfillment::traits::{CommandContext, FulfillmentError, FulfillmentResult};

/// Reserve `qty` units of a variant.
///
/// Succeeds only if `available >= qty`; increments `reserved`.
/// Returns the variant as read (pre-mutation metadata is what line-item
/// snapshots capture).
pub fn reserve(
    ctx: &CommandContext<'_>,
    variant_id: i64,
    qty: i64,
) -> FulfillmentResult<ProductVariant> {
    if qty <= 0 {
        return Err(FulfillmentError::Validation(format!(
            "reserve quantity must be positive, got {qty}"
        )));
    }

    let mut variant = ctx.variant(variant_id)?;
    if variant.is_archived {
        return Err(FulfillmentError::VariantArchived(variant_id));
    }

    let available = variant.available();
    if available < qty {
        return Err(FulfillmentError::InsufficientStock {
            variant_id,
            requested: qty,
            available,
        });
    }

    let snapshot = variant.clone();
    variant.reserved += qty;
    ctx.put_variant(&variant)?;

    tracing::debug!(
        variant_id,
        qty,
        reserved = variant.reserved,
        on_hand = variant.on_hand,
        "Stock reserved"
    );
    Ok(snapshot)
}

/// Convert a reservation into a permanent decrement:
/// `reserved -= qty; on_hand -= qty`.
///
/// Called on delivery. Out-of-band quantities are clamped with a
/// warning rather than driving the ledger negative; duplicate
/// settlement is prevented one level up by the order's reservation
/// marker.
pub fn commit(ctx: &CommandContext<'_>, variant_id: i64, qty: i64) -> FulfillmentResult<()> {
    if qty <= 0 {
        return Err(FulfillmentError::Validation(format!(
            "commit quantity must be positive, got {qty}"
        )));
    }

    let mut variant = ctx.variant(variant_id)?;
    if variant.reserved < qty || variant.on_hand < qty {
        tracing::warn!(
            variant_id,
            qty,
            reserved = variant.reserved,
            on_hand = variant.on_hand,
            "Commit exceeds ledger state, clamping"
        );
    }
    let settled = qty.min(variant.reserved).min(variant.on_hand);
    variant.reserved -= settled;
    variant.on_hand -= settled;
    ctx.put_variant(&variant)?;

    tracing::debug!(
        variant_id,
        qty = settled,
        reserved = variant.reserved,
        on_hand = variant.on_hand,
        "Reservation committed"
    );
    Ok(())
}

/// Reverse a reservation without touching on-hand stock:
/// `reserved -= qty`.
///
/// Called on cancellation before fulfillment. Releasing more than is
/// reserved clamps to zero with a warning (duplicate event delivery
/// must not corrupt the ledger).
pub fn release(ctx: &CommandContext<'_>, variant_id: i64, qty: i64) -> FulfillmentResult<()> {
    if qty <= 0 {
        return Err(FulfillmentError::Validation(format!(
            "release quantity must be positive, got {qty}"
        )));
    }

    let mut variant = ctx.variant(variant_id)?;
    if variant.reserved < qty {
        tracing::warn!(
            variant_id,
            qty,
            reserved = variant.reserved,
            "Release exceeds reserved quantity, clamping"
        );
    }
    variant.reserved = (variant.reserved - qty).max(0);
    ctx.put_variant(&variant)?;

    tracing::debug!(
        variant_id,
        qty,
        reserved = variant.reserved,
        "Reservation released"
    );
    Ok(())
}
