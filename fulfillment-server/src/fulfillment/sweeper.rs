//! Background sweeper
//!
//! Periodic maintenance loop:
//! - retries rider assignment for backlog shipments
//! - expires stale checkouts: orders still PENDING past the reservation
//!   TTL are cancelled by the SYSTEM actor, releasing their stock
//!
//! Registered as a `TaskKind::Periodic` task and stopped through the
//! shared `CancellationToken`.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::manager::FulfillmentManager;
use shared::order::{Actor, FulfillmentCommand, FulfillmentCommandPayload, OrderStatus};

/// Background sweeper for backlog retry and reservation expiry
pub struct FulfillmentSweeper {
    manager: FulfillmentManager,
    interval: Duration,
    reservation_ttl: Duration,
    shutdown: CancellationToken,
}

impl FulfillmentSweeper {
    pub fn new(
        manager: FulfillmentManager,
        interval: Duration,
        reservation_ttl: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            interval,
            reservation_ttl,
            shutdown,
        }
    }

    /// Main loop: sweep every `interval` until shutdown
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            reservation_ttl_secs = self.reservation_ttl.as_secs(),
            "Fulfillment sweeper started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {
                    self.sweep_once();
                }
            }
        }

        tracing::info!("Fulfillment sweeper stopped");
    }

    /// One sweep pass. Public so tests can drive it directly.
    pub fn sweep_once(&self) {
        self.expire_stale_pending();
        self.retry_backlog();
    }

    /// Cancel PENDING orders older than the reservation TTL
    fn expire_stale_pending(&self) {
        let cutoff = shared::util::now_millis() - self.reservation_ttl.as_millis() as i64;

        let open_orders = match self.manager.get_open_orders() {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Sweep could not list open orders");
                return;
            }
        };

        for snapshot in open_orders {
            if snapshot.status != OrderStatus::Pending || snapshot.created_at >= cutoff {
                continue;
            }

            tracing::info!(
                order_id = %snapshot.order_id,
                created_at = snapshot.created_at,
                "Expiring stale unconfirmed order"
            );
            let response = self.manager.execute_command(FulfillmentCommand::new(
                Actor::system(),
                FulfillmentCommandPayload::CancelOrder {
                    order_id: snapshot.order_id.clone(),
                    reason: Some("checkout abandoned, reservation expired".to_string()),
                },
            ));
            if !response.success {
                tracing::warn!(
                    order_id = %snapshot.order_id,
                    error = ?response.error,
                    "Stale-order expiry failed"
                );
            }
        }
    }

    /// Retry rider assignment for unassigned shipments
    fn retry_backlog(&self) {
        let backlog = match self.manager.list_backlog() {
            Ok(order_ids) => order_ids,
            Err(e) => {
                tracing::error!(error = %e, "Sweep could not list assignment backlog");
                return;
            }
        };

        if !backlog.is_empty() {
            tracing::info!(count = backlog.len(), "Retrying rider assignment backlog");
        }

        for order_id in backlog {
            let response = self.manager.execute_command(FulfillmentCommand::new(
                Actor::system(),
                FulfillmentCommandPayload::AssignRider {
                    order_id: order_id.clone(),
                },
            ));
            if !response.success {
                tracing::warn!(
                    order_id = %order_id,
                    error = ?response.error,
                    "Backlog assignment retry failed"
                );
            }
        }
    }
}
