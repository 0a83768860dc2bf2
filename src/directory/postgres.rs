//! PostgreSQL-backed subject directory over the `users` table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;

use super::{StoredSecret, SubjectDirectory, SubjectId, SubjectSnapshot};

#[derive(Clone, Debug)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn snapshot_from_row(row: &PgRow) -> Result<SubjectSnapshot> {
    let raw_id: String = row.get("id");
    Ok(SubjectSnapshot {
        id: SubjectId::parse(raw_id).context("stored subject id is malformed")?,
        name: row.get("name"),
        role: row.get("role"),
        email: row.get("email"),
        avatar: row.get("avatar"),
        wallet_balance: row.get("wallet_balance"),
    })
}

#[async_trait]
impl SubjectDirectory for PgDirectory {
    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<SubjectSnapshot>> {
        let query = r"
            SELECT id, name, role, email, avatar, wallet_balance
            FROM users
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup subject")?;
        row.as_ref().map(snapshot_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubjectSnapshot>> {
        let query = r"
            SELECT id, name, role, email, avatar, wallet_balance
            FROM users
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup subject by email")?;
        row.as_ref().map(snapshot_from_row).transpose()
    }

    async fn find_secret_by_email(&self, email: &str) -> Result<Option<StoredSecret>> {
        let query = r"
            SELECT id, password_hash
            FROM users
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup subject secret")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw_id: String = row.get("id");
        let hashed_secret: Option<String> = row.get("password_hash");
        let id = SubjectId::parse(raw_id).context("stored subject id is malformed")?;
        Ok(hashed_secret
            .filter(|hash| !hash.is_empty())
            .map(|hashed_secret| StoredSecret { id, hashed_secret }))
    }

    async fn update_secret(&self, id: &SubjectId, hashed_secret: &str) -> Result<()> {
        let query = r"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id.as_str())
            .bind(hashed_secret)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update subject secret")?;
        if result.rows_affected() == 0 {
            anyhow::bail!("subject {id} not found");
        }
        Ok(())
    }

    async fn mark_verified(&self, email: &str) -> Result<bool> {
        let query = r"
            UPDATE users
            SET is_verified = TRUE, updated_at = NOW()
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to mark subject verified")?;
        Ok(result.rows_affected() > 0)
    }
}
