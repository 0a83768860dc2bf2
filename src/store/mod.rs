//! Ephemeral keyed store: the single source of truth for time-bounded
//! security state (refresh registrations, activation codes, rate-limit
//! counters, reset tokens).
//!
//! Every operation is atomic per key. Nothing here spans keys atomically;
//! callers that touch several keys (bulk revocation) must be safe to re-run.

pub mod keys;
mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::{PgStore, spawn_expiry_sweeper};

#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value and expiry.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    /// Read a live value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove the given keys and report how many live entries were removed.
    ///
    /// A single-key call doubles as a compare-and-delete: a return of `1`
    /// means this caller, and no concurrent one, consumed the entry.
    async fn delete(&self, keys: &[String]) -> Result<u64>;

    /// Increment an integer counter, creating it at `1` without expiry.
    async fn increment(&self, key: &str) -> Result<i64>;

    /// Set the expiry of a live key. Returns `false` when the key is absent.
    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    /// Remaining lifetime of a live key, `None` when absent or without expiry.
    async fn ttl(&self, key: &str) -> Result<Option<u64>>;

    /// All live keys starting with `prefix`.
    async fn list_keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}
