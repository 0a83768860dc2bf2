//! Transactional-outbox notifier: each message becomes a pending
//! `email_outbox` row picked up by the mail worker.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::Instrument;

use super::{Notification, Notifier};

#[derive(Clone, Debug)]
pub struct OutboxNotifier {
    pool: PgPool,
}

impl OutboxNotifier {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let payload_text = serde_json::to_string(&notification.data)
            .context("failed to serialize notification payload")?;

        let query = r"
            INSERT INTO email_outbox (to_email, subject, template, payload_json)
            VALUES ($1, $2, $3, $4::jsonb)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&notification.to)
            .bind(&notification.subject)
            .bind(&notification.template)
            .bind(payload_text)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert email outbox row")?;
        Ok(())
    }
}
