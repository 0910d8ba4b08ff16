//! Notification dispatcher interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::order::ActorRole;
use thiserror::Error;

/// Notification kinds forwarded to the delivery layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    OrderPlaced,
    OrderStatusChanged,
    RiderAssigned,
    DeliveryFailed,
}

/// One notification addressed to one party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub order_id: String,
    pub recipient_id: i64,
    pub recipient_role: ActorRole,
    /// Human-readable payload; templating/localization happens downstream
    pub message: String,
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct DispatchError(pub String);

/// Delivery backend for notifications (email/SMS/push live behind this
/// interface, outside the engine).
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> Result<(), DispatchError>;
}

/// Default dispatcher: structured log output only
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notification: Notification) -> Result<(), DispatchError> {
        tracing::info!(
            kind = ?notification.kind,
            order_id = %notification.order_id,
            recipient_id = notification.recipient_id,
            recipient_role = %notification.recipient_role,
            message = %notification.message,
            "Notification dispatched"
        );
        Ok(())
    }
}
