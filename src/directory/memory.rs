//! In-process directory, used by tests and local tooling.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{StoredSecret, SubjectDirectory, SubjectId, SubjectSnapshot};

#[derive(Clone, Debug)]
struct Account {
    snapshot: SubjectSnapshot,
    hashed_secret: Option<String>,
    verified: bool,
}

#[derive(Default)]
pub struct MemoryDirectory {
    accounts: Mutex<HashMap<SubjectId, Account>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, snapshot: SubjectSnapshot) {
        let mut accounts = self.accounts.lock().await;
        accounts.insert(
            snapshot.id.clone(),
            Account {
                snapshot,
                hashed_secret: None,
                verified: false,
            },
        );
    }

    pub async fn remove(&self, id: &SubjectId) -> bool {
        self.accounts.lock().await.remove(id).is_some()
    }

    pub async fn hashed_secret(&self, id: &SubjectId) -> Option<String> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(id)
            .and_then(|account| account.hashed_secret.clone())
    }

    pub async fn is_verified(&self, id: &SubjectId) -> bool {
        let accounts = self.accounts.lock().await;
        accounts.get(id).is_some_and(|account| account.verified)
    }
}

#[async_trait]
impl SubjectDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<SubjectSnapshot>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.get(id).map(|account| account.snapshot.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubjectSnapshot>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .values()
            .find(|account| account.snapshot.email == email)
            .map(|account| account.snapshot.clone()))
    }

    async fn find_secret_by_email(&self, email: &str) -> Result<Option<StoredSecret>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .values()
            .find(|account| account.snapshot.email == email)
            .and_then(|account| {
                account.hashed_secret.clone().map(|hashed_secret| StoredSecret {
                    id: account.snapshot.id.clone(),
                    hashed_secret,
                })
            }))
    }

    async fn update_secret(&self, id: &SubjectId, hashed_secret: &str) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("subject {id} not found"))?;
        account.hashed_secret = Some(hashed_secret.to_string());
        Ok(())
    }

    async fn mark_verified(&self, email: &str) -> Result<bool> {
        let mut accounts = self.accounts.lock().await;
        let Some(account) = accounts
            .values_mut()
            .find(|account| account.snapshot.email == email)
        else {
            return Ok(false);
        };
        account.verified = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, email: &str) -> Result<SubjectSnapshot> {
        Ok(SubjectSnapshot {
            id: SubjectId::parse(id)?,
            name: "Ada".to_string(),
            role: "user".to_string(),
            email: email.to_string(),
            avatar: None,
            wallet_balance: 0.0,
        })
    }

    #[tokio::test]
    async fn update_secret_requires_existing_subject() -> Result<()> {
        let directory = MemoryDirectory::new();
        let missing = SubjectId::parse("ghost")?;
        assert!(directory.update_secret(&missing, "hash").await.is_err());

        let snapshot = snapshot("u1", "ada@example.com")?;
        let id = snapshot.id.clone();
        directory.insert(snapshot).await;
        directory.update_secret(&id, "hash").await?;
        assert_eq!(directory.hashed_secret(&id).await, Some("hash".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn secret_lookup_skips_accounts_without_secret() -> Result<()> {
        let directory = MemoryDirectory::new();
        let snapshot = snapshot("u1", "ada@example.com")?;
        let id = snapshot.id.clone();
        directory.insert(snapshot).await;

        assert!(
            directory
                .find_secret_by_email("ada@example.com")
                .await?
                .is_none()
        );
        directory.update_secret(&id, "hash").await?;
        let stored = directory.find_secret_by_email("ada@example.com").await?;
        assert_eq!(
            stored.map(|stored| (stored.id, stored.hashed_secret)),
            Some((id, "hash".to_string()))
        );
        assert!(directory.find_secret_by_email("bob@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn mark_verified_by_email() -> Result<()> {
        let directory = MemoryDirectory::new();
        let snapshot = snapshot("u1", "ada@example.com")?;
        let id = snapshot.id.clone();
        directory.insert(snapshot).await;

        assert!(!directory.mark_verified("nobody@example.com").await?);
        assert!(directory.mark_verified("ada@example.com").await?);
        assert!(directory.is_verified(&id).await);
        Ok(())
    }
}
