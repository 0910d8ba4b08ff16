//! Notification worker
//!
//! Listens on the manager's post-commit event broadcast and maps each
//! event to zero or more notifications. Runs until shutdown; a lagged
//! receiver logs and keeps going (notifications are best-effort).

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::dispatcher::{Notification, NotificationDispatcher, NotificationKind};
use crate::fulfillment::FulfillmentManager;
use shared::order::{ActorRole, EventPayload, OrderEvent};

/// Worker forwarding engine events to the notification dispatcher
pub struct NotifyWorker {
    manager: FulfillmentManager,
    dispatcher: Arc<dyn NotificationDispatcher>,
    shutdown: CancellationToken,
}

impl NotifyWorker {
    pub fn new(
        manager: FulfillmentManager,
        dispatcher: Arc<dyn NotificationDispatcher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            dispatcher,
            shutdown,
        }
    }

    /// Run until shutdown
    pub async fn run(self) {
        tracing::info!("Notification worker started");
        let mut rx = self.manager.subscribe();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = rx.recv() => {
                    match result {
                        Ok(event) => self.handle_event(&event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Notification worker lagged behind event stream");
                        }
                        Err(RecvError::Closed) => {
                            tracing::info!("Event channel closed, stopping notification worker");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Notification worker stopped");
    }

    async fn handle_event(&self, event: &OrderEvent) {
        for notification in self.notifications_for(event) {
            if let Err(e) = self.dispatcher.dispatch(notification.clone()).await {
                // Never propagate: delivery is best-effort
                tracing::warn!(
                    order_id = %notification.order_id,
                    kind = ?notification.kind,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }

    /// Map one event to its notifications
    fn notifications_for(&self, event: &OrderEvent) -> Vec<Notification> {
        // Buyer/seller ids come from the snapshot; events after
        // ORDER_PLACED do not carry them.
        let snapshot = match self.manager.get_snapshot(&event.order_id) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::warn!(order_id = %event.order_id, "No snapshot for event, skipping notification");
                return vec![];
            }
            Err(e) => {
                tracing::warn!(order_id = %event.order_id, error = %e, "Snapshot lookup failed, skipping notification");
                return vec![];
            }
        };

        let order_ref = if snapshot.order_number.is_empty() {
            event.order_id.clone()
        } else {
            snapshot.order_number.clone()
        };

        match &event.payload {
            EventPayload::OrderPlaced { seller_id, .. } => vec![Notification {
                kind: NotificationKind::OrderPlaced,
                order_id: event.order_id.clone(),
                recipient_id: *seller_id,
                recipient_role: ActorRole::Seller,
                message: format!("New order {order_ref} awaiting confirmation"),
            }],
            EventPayload::OrderConfirmed {} => vec![self.buyer_status(&snapshot, &order_ref, "confirmed")],
            EventPayload::PackingStarted {} => vec![],
            EventPayload::ReadyForPickup {} => vec![],
            EventPayload::OrderReleased { .. } => {
                vec![self.buyer_status(&snapshot, &order_ref, "out for fulfillment")]
            }
            EventPayload::RiderAssigned { rider_id, .. } => vec![Notification {
                kind: NotificationKind::RiderAssigned,
                order_id: event.order_id.clone(),
                recipient_id: *rider_id,
                recipient_role: ActorRole::Rider,
                message: format!("New delivery assigned for order {order_ref}"),
            }],
            EventPayload::ShipmentProgressed { to, .. } => {
                vec![self.buyer_status(&snapshot, &order_ref, &to.to_string().to_lowercase())]
            }
            EventPayload::OrderDelivered { .. } => {
                vec![self.buyer_status(&snapshot, &order_ref, "delivered")]
            }
            EventPayload::DeliveryFailed { reason, .. } => vec![Notification {
                kind: NotificationKind::DeliveryFailed,
                order_id: event.order_id.clone(),
                recipient_id: snapshot.seller_id,
                recipient_role: ActorRole::Seller,
                message: format!(
                    "Delivery failed for order {order_ref}{}",
                    reason
                        .as_deref()
                        .map(|r| format!(": {r}"))
                        .unwrap_or_default()
                ),
            }],
            EventPayload::OrderCancelled { .. } => {
                // Tell the counterparty of whoever cancelled
                let (recipient_id, recipient_role) = if event.actor.role == ActorRole::Seller {
                    (snapshot.buyer_id, ActorRole::Buyer)
                } else {
                    (snapshot.seller_id, ActorRole::Seller)
                };
                vec![Notification {
                    kind: NotificationKind::OrderStatusChanged,
                    order_id: event.order_id.clone(),
                    recipient_id,
                    recipient_role,
                    message: format!("Order {order_ref} was cancelled"),
                }]
            }
            EventPayload::OrderReturned { .. } => vec![Notification {
                kind: NotificationKind::OrderStatusChanged,
                order_id: event.order_id.clone(),
                recipient_id: snapshot.seller_id,
                recipient_role: ActorRole::Seller,
                message: format!("Return requested for order {order_ref}"),
            }],
        }
    }

    fn buyer_status(
        &self,
        snapshot: &shared::order::OrderSnapshot,
        order_ref: &str,
        stage: &str,
    ) -> Notification {
        Notification {
            kind: NotificationKind::OrderStatusChanged,
            order_id: snapshot.order_id.clone(),
            recipient_id: snapshot.buyer_id,
            recipient_role: ActorRole::Buyer,
            message: format!("Order {order_ref} is now {stage}"),
        }
    }
}
