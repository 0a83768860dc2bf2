//! Account activation codes with a fixed-window issuance limit.
//!
//! Each address holds at most one live code; issuing overwrites. The
//! rate-limit counter is created by the first issuance of a window and gets
//! its expiry only then, so the window is anchored to first use.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use super::config::CredentialConfig;
use super::error::Error;
use super::utils::{constant_time_eq, generate_code, normalize_address, valid_address};
use crate::notify::{ACTIVATION_TEMPLATE, Notification, Notifier};
use crate::store::{EphemeralStore, keys};

const ACTIVATION_SUBJECT: &str = "Verify your account";

#[derive(Clone)]
pub struct CodeService {
    config: CredentialConfig,
    store: Arc<dyn EphemeralStore>,
    notifier: Arc<dyn Notifier>,
}

impl CodeService {
    #[must_use]
    pub fn new(
        config: CredentialConfig,
        store: Arc<dyn EphemeralStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
        }
    }

    /// Fail when the address already used up its issuances for this window.
    ///
    /// # Errors
    /// Returns [`Error::RateLimited`] with the remaining window length.
    pub async fn check_rate_limit(&self, address: &str) -> Result<(), Error> {
        let address = normalize_address(address);
        let limit_key = keys::otp_limit_key(&address);
        let issued = self
            .store
            .get(&limit_key)
            .await
            .map_err(Error::Store)?
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(0);
        if issued >= self.config.otp_max_issuances() {
            return Err(self.rate_limited(&limit_key).await);
        }
        Ok(())
    }

    /// Generate a code, store it and hand it to the notifier.
    ///
    /// A notification failure is returned as is; the stored code and the
    /// counter increment are kept.
    ///
    /// # Errors
    /// - [`Error::InvalidAddress`] for a malformed address.
    /// - [`Error::RateLimited`] once the window is used up.
    /// - [`Error::Notification`] if delivery fails.
    pub async fn issue_code(&self, address: &str, name: &str) -> Result<(), Error> {
        let address = normalize_address(address);
        if !valid_address(&address) {
            return Err(Error::InvalidAddress);
        }
        self.check_rate_limit(&address).await?;

        let limit_key = keys::otp_limit_key(&address);
        let issued = self
            .store
            .increment(&limit_key)
            .await
            .map_err(Error::Store)?;
        if issued == 1 {
            self.store
                .set_expiry(&limit_key, self.config.otp_window_seconds())
                .await
                .map_err(Error::Store)?;
        }
        // Concurrent requests can pass the read-only check together; the
        // counter value decides.
        if issued > self.config.otp_max_issuances() {
            return Err(self.rate_limited(&limit_key).await);
        }

        let code = generate_code();
        self.store
            .set_with_expiry(&keys::otp_key(&address), &code, self.config.otp_ttl_seconds())
            .await
            .map_err(Error::Store)?;

        let notification = Notification {
            to: address.clone(),
            subject: ACTIVATION_SUBJECT.to_string(),
            template: ACTIVATION_TEMPLATE.to_string(),
            data: json!({ "name": name, "otp": code }),
        };
        self.notifier
            .send(&notification)
            .await
            .map_err(Error::Notification)?;

        debug!(address = %address, issued, "issued activation code");
        Ok(())
    }

    /// Check a presented code and consume it.
    ///
    /// # Errors
    /// - [`Error::CodeExpired`] if no code is stored (never issued, lapsed or
    ///   already used).
    /// - [`Error::CodeMismatch`] if the code differs; the stored code stays.
    pub async fn verify_code(&self, address: &str, presented: &str) -> Result<(), Error> {
        let address = normalize_address(address);
        let key = keys::otp_key(&address);
        let stored = self
            .store
            .get(&key)
            .await
            .map_err(Error::Store)?
            .ok_or(Error::CodeExpired)?;
        if !constant_time_eq(&stored, presented.trim()) {
            return Err(Error::CodeMismatch);
        }
        // Another verification may have consumed it since the read.
        if self.store.delete(&[key]).await.map_err(Error::Store)? == 0 {
            return Err(Error::CodeExpired);
        }
        debug!(address = %address, "activation code verified");
        Ok(())
    }

    async fn rate_limited(&self, limit_key: &str) -> Error {
        let retry_after_seconds = match self.store.ttl(limit_key).await {
            Ok(Some(remaining)) => remaining,
            Ok(None) => self.config.otp_window_seconds(),
            Err(err) => return Error::Store(err),
        };
        warn!(key = %limit_key, retry_after_seconds, "activation code rate limit hit");
        Error::RateLimited {
            retry_after_seconds,
        }
    }
}
