//! Notification dispatch
//!
//! The engine never blocks a transition on notification delivery: the
//! worker consumes the post-commit event broadcast and forwards
//! notifications fire-and-forget. Delivery failures are logged, never
//! propagated.

pub mod dispatcher;
pub mod worker;

pub use dispatcher::{LogDispatcher, Notification, NotificationDispatcher, NotificationKind};
pub use worker::NotifyWorker;
