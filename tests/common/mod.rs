//! Shared harness: in-memory backends, a recording notifier and a manual
//! clock so tests can move time forward.

#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tessera::clock::ManualClock;
use tessera::directory::{MemoryDirectory, SubjectId, SubjectSnapshot};
use tessera::notify::{Notification, Notifier};
use tessera::session::{CredentialConfig, CredentialService, SigningKeys};
use tessera::store::MemoryStore;
use tokio::sync::Mutex;

pub const START: i64 = 1_700_000_000;

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Last value of `field` in the template data sent to `to`.
    pub async fn last_field(&self, to: &str, field: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|notification| notification.to == to)
            .and_then(|notification| notification.data.get(field))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("mail relay unavailable");
        }
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

pub struct Context {
    pub service: CredentialService,
    pub store: Arc<MemoryStore>,
    pub directory: Arc<MemoryDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl Context {
    pub async fn new() -> Result<Self> {
        let clock = Arc::new(ManualClock::new(START));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let directory = Arc::new(MemoryDirectory::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let keys = SigningKeys::new(
            SecretString::from("integration-access-key"),
            SecretString::from("integration-refresh-key"),
        )?;
        let service = CredentialService::new(
            keys,
            CredentialConfig::new().with_frontend_base_url("https://shop.example".to_string()),
            store.clone(),
            directory.clone(),
            notifier.clone(),
            clock.clone(),
        );

        directory.insert(snapshot("u1", "ada@x.com")?).await;
        directory.insert(snapshot("u2", "bob@x.com")?).await;

        Ok(Self {
            service,
            store,
            directory,
            notifier,
            clock,
        })
    }
}

pub fn subject(id: &str) -> Result<SubjectId> {
    Ok(SubjectId::parse(id)?)
}

pub fn snapshot(id: &str, email: &str) -> Result<SubjectSnapshot> {
    Ok(SubjectSnapshot {
        id: subject(id)?,
        name: format!("user {id}"),
        role: "user".to_string(),
        email: email.to_string(),
        avatar: None,
        wallet_balance: 0.0,
    })
}
