//! Outbound notification seam.
//!
//! Codes and reset links leave the process through a [`Notifier`]. Delivery
//! failures are returned to the caller, never swallowed: an activation code
//! that was stored but not delivered is the caller's decision to handle.
//!
//! The default sender for local dev is [`LogNotifier`], which logs the
//! envelope (never the payload values) and returns `Ok(())`. Deployments use
//! [`OutboxNotifier`], which enqueues rows in `email_outbox` for a separate
//! mail worker.

mod outbox;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

pub use outbox::OutboxNotifier;

pub const ACTIVATION_TEMPLATE: &str = "user-activation-mail";
pub const PASSWORD_RESET_TEMPLATE: &str = "password-reset-template";

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver (or durably enqueue) a message, or return an error.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let fields: Vec<&str> = notification
            .data
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default();
        info!(
            to = %notification.to,
            template = %notification.template,
            fields = ?fields,
            "notification send stub"
        );
        Ok(())
    }
}
