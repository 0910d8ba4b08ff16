//! Rider assignment policy
//!
//! Selects a rider for a released order. Candidates must be available,
//! in an assignable status, under their concurrent-shipment cap, and
//! serving the order's destination. Ranking:
//!
//! 1. fewest currently active shipments
//! 2. highest historical rating
//! 3. earliest registration date
//!
//! An empty candidate set is a backlog condition, not a failure: the
//! caller leaves the shipment unassigned and retries later.

use shared::models::{AddressSnapshot, Rider};
use thiserror::Error;

/// Assignment policy knobs
#[derive(Debug, Clone, Copy)]
pub struct AssignmentPolicy {
    /// Per-rider concurrent shipment cap
    pub max_active_deliveries: u32,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            max_active_deliveries: 3,
        }
    }
}

/// No rider currently matches the candidate criteria
#[derive(Debug, Clone, Error)]
#[error("no eligible rider for {region}")]
pub struct NoRiderAvailable {
    pub region: String,
}

/// Select the best rider for a destination, or report the backlog
/// condition.
pub fn select_rider(
    riders: Vec<Rider>,
    destination: &AddressSnapshot,
    policy: &AssignmentPolicy,
) -> Result<Rider, NoRiderAvailable> {
    let mut candidates: Vec<Rider> = riders
        .into_iter()
        .filter(|r| {
            r.is_available
                && r.status.is_assignable()
                && r.active_deliveries < policy.max_active_deliveries
                && (r.serves(destination.region()) || r.serves(&destination.province))
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.active_deliveries
            .cmp(&b.active_deliveries)
            .then(b.rating.cmp(&a.rating))
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| NoRiderAvailable {
            region: destination.region().to_string(),
        })
}
