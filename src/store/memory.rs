//! In-process store with lazy expiry, driven by an injectable clock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::EphemeralStore;
use crate::clock::{Clock, SystemClock};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: Option<i64>,
}

impl Entry {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn expiry(&self, ttl_seconds: u64) -> i64 {
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        self.clock.now_unix().saturating_add(ttl)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let expires_at = Some(self.expiry(ttl_seconds));
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now_unix();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        let now = self.clock.now_unix();
        let mut entries = self.entries.lock().await;
        let mut removed = 0;
        for key in keys {
            if entries.remove(key).is_some_and(|entry| entry.is_live(now)) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let now = self.clock.now_unix();
        let mut entries = self.entries.lock().await;
        let next = match entries.get(key).filter(|entry| entry.is_live(now)) {
            Some(entry) => {
                let current: i64 = entry
                    .value
                    .parse()
                    .with_context(|| format!("value at {key} is not an integer"))?;
                let incremented = current
                    .checked_add(1)
                    .with_context(|| format!("counter at {key} overflowed"))?;
                Entry {
                    value: incremented.to_string(),
                    expires_at: entry.expires_at,
                }
            }
            None => Entry {
                value: "1".to_string(),
                expires_at: None,
            },
        };
        let count: i64 = next.value.parse().context("counter is not an integer")?;
        entries.insert(key.to_string(), next);
        Ok(count)
    }

    async fn set_expiry(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let now = self.clock.now_unix();
        let expires_at = self.expiry(ttl_seconds);
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key).filter(|entry| entry.is_live(now)) {
            Some(entry) => {
                entry.expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let now = self.clock.now_unix();
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.expires_at)
            .map(|at| u64::try_from(at - now).unwrap_or(0)))
    }

    async fn list_keys_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let now = self.clock.now_unix();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.is_live(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use anyhow::Result;

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = MemoryStore::with_clock(clock.clone());
        (clock, store)
    }

    #[tokio::test]
    async fn values_expire_after_ttl() -> Result<()> {
        let (clock, store) = store();
        store.set_with_expiry("k", "v", 10).await?;
        clock.advance(9);
        assert_eq!(store.get("k").await?, Some("v".to_string()));
        assert_eq!(store.ttl("k").await?, Some(1));
        clock.advance(1);
        assert_eq!(store.get("k").await?, None);
        assert_eq!(store.ttl("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn set_overwrites_value_and_expiry() -> Result<()> {
        let (clock, store) = store();
        store.set_with_expiry("k", "old", 5).await?;
        store.set_with_expiry("k", "new", 50).await?;
        clock.advance(10);
        assert_eq!(store.get("k").await?, Some("new".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn delete_counts_only_live_entries() -> Result<()> {
        let (clock, store) = store();
        store.set_with_expiry("a", "1", 5).await?;
        store.set_with_expiry("b", "1", 50).await?;
        clock.advance(10);
        let removed = store
            .delete(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await?;
        assert_eq!(removed, 1);
        assert_eq!(store.delete(&["b".to_string()]).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn increment_restarts_after_expiry() -> Result<()> {
        let (clock, store) = store();
        assert_eq!(store.increment("n").await?, 1);
        assert!(store.set_expiry("n", 60).await?);
        assert_eq!(store.increment("n").await?, 2);
        assert_eq!(store.ttl("n").await?, Some(60));
        clock.advance(60);
        assert_eq!(store.increment("n").await?, 1);
        assert_eq!(store.ttl("n").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn increment_rejects_non_integer() -> Result<()> {
        let (_clock, store) = store();
        store.set_with_expiry("n", "valid", 60).await?;
        assert!(store.increment("n").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn set_expiry_on_missing_key() -> Result<()> {
        let (_clock, store) = store();
        assert!(!store.set_expiry("missing", 60).await?);
        Ok(())
    }

    #[tokio::test]
    async fn list_keys_by_prefix_skips_expired() -> Result<()> {
        let (clock, store) = store();
        store.set_with_expiry("p:1", "v", 5).await?;
        store.set_with_expiry("p:2", "v", 50).await?;
        store.set_with_expiry("q:1", "v", 50).await?;
        clock.advance(10);
        assert_eq!(store.list_keys_by_prefix("p:").await?, vec!["p:2".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_single_key_delete_has_one_winner() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.set_with_expiry("k", "valid", 60).await?;
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.delete(&["k".to_string()]).await
            }));
        }
        let mut total = 0;
        for handle in handles {
            total += handle.await??;
        }
        assert_eq!(total, 1);
        Ok(())
    }
}
