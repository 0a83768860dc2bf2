use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{str::FromStr, sync::Arc};
use tracing::debug;

use crate::clock::SystemClock;
use crate::directory::PgDirectory;
use crate::notify::OutboxNotifier;
use crate::session::{CredentialConfig, CredentialService, SigningKeys};
use crate::store::PgStore;

/// Connect to PostgreSQL, tagging sessions with the crate user agent.
///
/// # Errors
/// Returns an error if the DSN is invalid or the database is unreachable.
pub async fn connect(dsn: &SecretString) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(dsn.expose_secret())
        .context("invalid database connection string")?
        .application_name(crate::APP_USER_AGENT);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .context("failed to connect to database")?;
    debug!("connected to database");
    Ok(pool)
}

#[derive(Clone)]
pub struct GlobalArgs {
    pub dsn: SecretString,
    pub keys: SigningKeys,
    pub config: CredentialConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(dsn: SecretString, keys: SigningKeys, config: CredentialConfig) -> Self {
        Self { dsn, keys, config }
    }

    /// Wire a [`CredentialService`] to the PostgreSQL backends.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn service(&self) -> Result<CredentialService> {
        let pool = connect(&self.dsn).await?;
        Ok(CredentialService::new(
            self.keys.clone(),
            self.config.clone(),
            Arc::new(PgStore::new(pool.clone())),
            Arc::new(PgDirectory::new(pool.clone())),
            Arc::new(OutboxNotifier::new(pool)),
            Arc::new(SystemClock),
        ))
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("dsn", &"***")
            .field("keys", &"***")
            .field("config", &self.config)
            .finish()
    }
}
