use crate::cli::globals::connect;
use crate::store::{PgStore, spawn_expiry_sweeper};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub dsn: SecretString,
    /// `None` sweeps once and exits.
    pub interval: Option<Duration>,
}

/// Delete expired store rows, once or on an interval until the task ends.
/// # Errors
/// Returns an error if the database is unreachable or the sweep fails.
pub async fn execute(args: Args) -> Result<()> {
    let pool = connect(&args.dsn).await?;
    let store = PgStore::new(pool);

    match args.interval {
        None => {
            let removed = store.sweep_expired().await?;
            info!(removed, "swept expired keys");
            println!("{removed}");
        }
        Some(interval) => {
            info!(interval_seconds = interval.as_secs(), "starting expiry sweeper");
            spawn_expiry_sweeper(store, interval)
                .await
                .context("expiry sweeper task failed")?;
        }
    }
    Ok(())
}
