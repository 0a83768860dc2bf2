//! Single-use password-reset tokens.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use super::config::CredentialConfig;
use super::error::Error;
use super::rotation::RotationEngine;
use super::utils::{build_reset_url, constant_time_eq, generate_reset_token, hash_secret};
use crate::directory::{SubjectDirectory, SubjectId};
use crate::notify::{Notification, Notifier, PASSWORD_RESET_TEMPLATE};
use crate::store::{EphemeralStore, keys};

const RESET_SUBJECT: &str = "Reset your password";

#[derive(Clone)]
pub struct ResetService {
    config: CredentialConfig,
    store: Arc<dyn EphemeralStore>,
    directory: Arc<dyn SubjectDirectory>,
    notifier: Arc<dyn Notifier>,
    sessions: RotationEngine,
}

impl ResetService {
    #[must_use]
    pub fn new(
        config: CredentialConfig,
        store: Arc<dyn EphemeralStore>,
        directory: Arc<dyn SubjectDirectory>,
        notifier: Arc<dyn Notifier>,
        sessions: RotationEngine,
    ) -> Self {
        Self {
            config,
            store,
            directory,
            notifier,
            sessions,
        }
    }

    /// Store a fresh token for `subject`, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`Error::Store`] if the token cannot be written.
    pub async fn issue_reset_token(&self, subject: &SubjectId) -> Result<String, Error> {
        let token = generate_reset_token().map_err(Error::Entropy)?;
        self.store
            .set_with_expiry(
                &keys::password_reset_key(subject),
                &token,
                self.config.reset_token_ttl_seconds(),
            )
            .await
            .map_err(Error::Store)?;
        debug!(subject = %subject, "issued password reset token");
        Ok(token)
    }

    /// Issue a token and mail the reset link to the subject.
    ///
    /// Unknown subjects are a silent no-op so the caller can not be used to
    /// probe for accounts.
    ///
    /// # Errors
    /// Returns [`Error::Notification`] if delivery fails.
    pub async fn send_reset_link(&self, subject: &SubjectId) -> Result<(), Error> {
        let Some(snapshot) = self
            .directory
            .find_by_id(subject)
            .await
            .map_err(Error::Directory)?
        else {
            debug!(subject = %subject, "password reset requested for unknown subject");
            return Ok(());
        };

        let token = self.issue_reset_token(subject).await?;
        let reset_url = build_reset_url(self.config.frontend_base_url(), &token, subject.as_str())
            .map_err(Error::Notification)?;
        let notification = Notification {
            to: snapshot.email,
            subject: RESET_SUBJECT.to_string(),
            template: PASSWORD_RESET_TEMPLATE.to_string(),
            data: json!({ "name": snapshot.name, "resetUrl": reset_url }),
        };
        self.notifier
            .send(&notification)
            .await
            .map_err(Error::Notification)
    }

    /// Redeem a reset token: set the new secret and end every session.
    ///
    /// The token is consumed before the secret changes; a mismatched token
    /// leaves the stored one untouched.
    ///
    /// # Errors
    /// - [`Error::TokenInvalid`] if no token is stored or it does not match.
    /// - [`Error::Hash`], [`Error::Directory`], [`Error::Store`] on
    ///   collaborator failures.
    pub async fn consume_reset_token(
        &self,
        subject: &SubjectId,
        token: &str,
        new_secret: &str,
    ) -> Result<(), Error> {
        let key = keys::password_reset_key(subject);
        let stored = self
            .store
            .get(&key)
            .await
            .map_err(Error::Store)?
            .ok_or(Error::TokenInvalid)?;
        if !constant_time_eq(&stored, token) {
            return Err(Error::TokenInvalid);
        }

        let hashed = hash_secret(new_secret).map_err(Error::Hash)?;
        if self.store.delete(&[key]).await.map_err(Error::Store)? == 0 {
            return Err(Error::TokenInvalid);
        }
        self.directory
            .update_secret(subject, &hashed)
            .await
            .map_err(Error::Directory)?;

        let revoked = self.sessions.revoke_all(subject).await?;
        info!(subject = %subject, revoked, "password reset completed");
        Ok(())
    }
}
