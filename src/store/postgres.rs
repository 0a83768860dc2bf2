//! PostgreSQL-backed ephemeral store.
//!
//! Entries live in a single `ephemeral_keys` table. Reads filter on
//! `expires_at` so an expired row is invisible the moment it lapses; the
//! sweeper only reclaims space. Per-key atomicity comes from single-statement
//! upserts and `DELETE ... RETURNING`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{Instrument, Span, debug, error, info_span};

use super::EphemeralStore;

const SET_WITH_EXPIRY: &str = r"
    INSERT INTO ephemeral_keys (key, value, expires_at)
    VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ON CONFLICT (key) DO UPDATE
    SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
";

const GET: &str = r"
    SELECT value
    FROM ephemeral_keys
    WHERE key = $1
      AND (expires_at IS NULL OR expires_at > NOW())
";

// Expired rows are removed too, but only live ones are counted.
const DELETE: &str = r"
    DELETE FROM ephemeral_keys
    WHERE key = ANY($1)
    RETURNING (expires_at IS NULL OR expires_at > NOW()) AS live
";

// Every SET expression sees the pre-update row, so an expired counter restarts at 1.
const INCREMENT: &str = r"
    INSERT INTO ephemeral_keys (key, value, expires_at)
    VALUES ($1, '1', NULL)
    ON CONFLICT (key) DO UPDATE
    SET value = CASE
            WHEN ephemeral_keys.expires_at IS NOT NULL AND ephemeral_keys.expires_at <= NOW()
            THEN '1'
            ELSE (ephemeral_keys.value::BIGINT + 1)::TEXT
        END,
        expires_at = CASE
            WHEN ephemeral_keys.expires_at IS NOT NULL AND ephemeral_keys.expires_at <= NOW()
            THEN NULL
            ELSE ephemeral_keys.expires_at
        END
    RETURNING value::BIGINT AS value
";

const SET_EXPIRY: &str = r"
    UPDATE ephemeral_keys
    SET expires_at = NOW() + ($2 * INTERVAL '1 second')
    WHERE key = $1
      AND (expires_at IS NULL OR expires_at > NOW())
";

const TTL: &str = r"
    SELECT CEIL(EXTRACT(EPOCH FROM (expires_at - NOW())))::BIGINT AS ttl
    FROM ephemeral_keys
    WHERE key = $1
      AND (expires_at IS NULL OR expires_at > NOW())
";

const LIST_BY_PREFIX: &str = r"
    SELECT key
    FROM ephemeral_keys
    WHERE starts_with(key, $1)
      AND (expires_at IS NULL OR expires_at > NOW())
    ORDER BY key
";

const SWEEP: &str = r"
    DELETE FROM ephemeral_keys
    WHERE expires_at IS NOT NULL
      AND expires_at <= NOW()
";

fn query_span(operation: &'static str, statement: &'static str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn ttl_param(ttl_seconds: u64) -> i64 {
    i64::try_from(ttl_seconds).unwrap_or(i64::MAX)
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete every expired row, returning how many were removed.
    ///
    /// # Errors
    /// Returns an error if the delete statement fails.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let result = sqlx::query(SWEEP)
            .execute(&self.pool)
            .instrument(query_span("DELETE", SWEEP))
            .await
            .context("failed to sweep expired keys")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl EphemeralStore for PgStore {
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        sqlx::query(SET_WITH_EXPIRY)
            .bind(key)
            .bind(value)
            .bind(ttl_param(ttl_seconds))
            .execute(&self.pool)
            .instrument(query_span("INSERT", SET_WITH_EXPIRY))
            .await
            .context("failed to write ephemeral key")?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query(GET)
            .bind(key)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", GET))
            .await
            .context("failed to read ephemeral key")?;
        Ok(row.map(|row| row.get("value")))
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let rows = sqlx::query(DELETE)
            .bind(keys)
            .fetch_all(&self.pool)
            .instrument(query_span("DELETE", DELETE))
            .await
            .context("failed to delete ephemeral keys")?;
        let live = rows
            .iter()
            .filter(|row| row.get::<bool, _>("live"))
            .count();
        Ok(u64::try_from(live).unwrap_or(u64::MAX))
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let row = sqlx::query(INCREMENT)
            .bind(key)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", INCREMENT))
            .await
            .context("failed to increment counter")?;
        Ok(row.get("value"))
    }

    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let result = sqlx::query(SET_EXPIRY)
            .bind(key)
            .bind(ttl_param(ttl_seconds))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", SET_EXPIRY))
            .await
            .context("failed to set key expiry")?;
        Ok(result.rows_affected() > 0)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let row = sqlx::query(TTL)
            .bind(key)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", TTL))
            .await
            .context("failed to read key ttl")?;
        Ok(row
            .and_then(|row| row.get::<Option<i64>, _>("ttl"))
            .map(|seconds| u64::try_from(seconds).unwrap_or(0)))
    }

    async fn list_keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(LIST_BY_PREFIX)
            .bind(prefix)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", LIST_BY_PREFIX))
            .await
            .context("failed to list ephemeral keys")?;
        Ok(rows.iter().map(|row| row.get("key")).collect())
    }
}

/// Spawn a background task that periodically deletes expired rows.
pub fn spawn_expiry_sweeper(store: PgStore, interval: Duration) -> tokio::task::JoinHandle<()> {
    let interval = if interval.is_zero() {
        Duration::from_secs(1)
    } else {
        interval
    };
    tokio::spawn(async move {
        loop {
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "swept expired ephemeral keys"),
                Err(err) => error!("ephemeral key sweep failed: {err}"),
            }
            sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn live_filters_guard_every_read() {
        for statement in [GET, TTL, LIST_BY_PREFIX, SET_EXPIRY] {
            assert!(
                statement.contains("expires_at IS NULL OR expires_at > NOW()"),
                "missing expiry filter: {statement}"
            );
        }
    }

    #[test]
    fn ttl_param_saturates() {
        assert_eq!(ttl_param(300), 300);
        assert_eq!(ttl_param(u64::MAX), i64::MAX);
    }

    #[tokio::test]
    async fn delete_of_no_keys_skips_database() -> anyhow::Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let store = PgStore::new(pool);
        assert_eq!(store.delete(&[]).await?, 0);
        Ok(())
    }
}
