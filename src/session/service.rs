//! Inbound facade: one value wiring the credential components to their
//! collaborators, exposing every operation the request layer calls.

use std::sync::Arc;

use tracing::{debug, info};

use super::config::{CredentialConfig, SigningKeys};
use super::error::Error;
use super::issuer::{CredentialIssuer, CredentialPair};
use super::otp::CodeService;
use super::reset::ResetService;
use super::rotation::{Rotation, RotationEngine};
use super::utils::{normalize_address, verify_secret};
use super::verifier::{CredentialVerifier, Principal};
use crate::clock::Clock;
use crate::directory::{SubjectDirectory, SubjectId};
use crate::notify::Notifier;
use crate::store::EphemeralStore;

#[derive(Clone)]
pub struct CredentialService {
    issuer: CredentialIssuer,
    verifier: CredentialVerifier,
    rotation: RotationEngine,
    codes: CodeService,
    resets: ResetService,
    directory: Arc<dyn SubjectDirectory>,
}

impl CredentialService {
    #[must_use]
    pub fn new(
        keys: SigningKeys,
        config: CredentialConfig,
        store: Arc<dyn EphemeralStore>,
        directory: Arc<dyn SubjectDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let issuer = CredentialIssuer::new(
            keys.clone(),
            config.clone(),
            store.clone(),
            clock.clone(),
        );
        let verifier = CredentialVerifier::new(keys, clock);
        let rotation = RotationEngine::new(
            issuer.clone(),
            verifier.clone(),
            store.clone(),
            directory.clone(),
        );
        let codes = CodeService::new(config.clone(), store.clone(), notifier.clone());
        let resets = ResetService::new(
            config,
            store,
            directory.clone(),
            notifier,
            rotation.clone(),
        );
        Self {
            issuer,
            verifier,
            rotation,
            codes,
            resets,
            directory,
        }
    }

    /// # Errors
    /// See [`CredentialIssuer::issue`].
    pub async fn issue(&self, subject: &SubjectId) -> Result<CredentialPair, Error> {
        self.issuer.issue(subject).await
    }

    /// Password sign-in: check the secret against the stored Argon2id hash
    /// and start a new session.
    ///
    /// # Errors
    /// - [`Error::InvalidLogin`] for an unknown address, an account without a
    ///   local secret, or a wrong secret.
    /// - [`Error::Directory`] and issuance failures from
    ///   [`CredentialIssuer::issue`].
    pub async fn login(&self, email: &str, secret: &str) -> Result<CredentialPair, Error> {
        let email = normalize_address(email);
        let stored = self
            .directory
            .find_secret_by_email(&email)
            .await
            .map_err(Error::Directory)?;
        let Some(stored) = stored.filter(|stored| verify_secret(secret, &stored.hashed_secret))
        else {
            debug!(address = %email, "password sign-in rejected");
            return Err(Error::InvalidLogin);
        };
        let pair = self.issuer.issue(&stored.id).await?;
        info!(subject = %stored.id, "password sign-in");
        Ok(pair)
    }

    /// # Errors
    /// See [`RotationEngine::rotate`].
    pub async fn rotate(&self, refresh_credential: &str) -> Result<Rotation, Error> {
        self.rotation.rotate(refresh_credential).await
    }

    /// # Errors
    /// See [`CredentialVerifier::verify`].
    pub fn verify(&self, access_credential: &str) -> Result<SubjectId, Error> {
        self.verifier.verify(access_credential)
    }

    /// Verify an access credential and load the subject behind it.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCredential`] for a bad credential and
    /// [`Error::SubjectNotFound`] if the subject no longer exists.
    pub async fn authenticate(&self, access_credential: &str) -> Result<Principal, Error> {
        let subject = self.verifier.verify(access_credential)?;
        let snapshot = self
            .directory
            .find_by_id(&subject)
            .await
            .map_err(Error::Directory)?
            .ok_or_else(|| Error::SubjectNotFound {
                subject: subject.to_string(),
            })?;
        Ok(Principal { subject: snapshot })
    }

    /// # Errors
    /// See [`CodeService::check_rate_limit`].
    pub async fn check_rate_limit(&self, address: &str) -> Result<(), Error> {
        self.codes.check_rate_limit(address).await
    }

    /// # Errors
    /// See [`CodeService::issue_code`].
    pub async fn issue_code(&self, address: &str, name: &str) -> Result<(), Error> {
        self.codes.issue_code(address, name).await
    }

    /// # Errors
    /// See [`CodeService::verify_code`].
    pub async fn verify_code(&self, address: &str, code: &str) -> Result<(), Error> {
        self.codes.verify_code(address, code).await
    }

    /// Consume an activation code and mark the owning subject verified.
    ///
    /// The owner is looked up first; a code sent to an address without an
    /// account is left in place.
    ///
    /// # Errors
    /// [`Error::SubjectNotFound`] when no subject owns the address, otherwise
    /// any [`CodeService::verify_code`] failure.
    pub async fn activate(&self, address: &str, code: &str) -> Result<(), Error> {
        let address = normalize_address(address);
        let owner = self
            .directory
            .find_by_email(&address)
            .await
            .map_err(Error::Directory)?;
        if owner.is_none() {
            return Err(Error::SubjectNotFound { subject: address });
        }
        self.codes.verify_code(&address, code).await?;
        let found = self
            .directory
            .mark_verified(&address)
            .await
            .map_err(Error::Directory)?;
        if !found {
            return Err(Error::SubjectNotFound { subject: address });
        }
        info!(address = %address, "account activated");
        Ok(())
    }

    /// # Errors
    /// See [`ResetService::issue_reset_token`].
    pub async fn issue_reset_token(&self, subject: &SubjectId) -> Result<String, Error> {
        self.resets.issue_reset_token(subject).await
    }

    /// # Errors
    /// See [`ResetService::send_reset_link`].
    pub async fn send_reset_link(&self, subject: &SubjectId) -> Result<(), Error> {
        self.resets.send_reset_link(subject).await
    }

    /// # Errors
    /// See [`ResetService::consume_reset_token`].
    pub async fn consume_reset_token(
        &self,
        subject: &SubjectId,
        token: &str,
        new_secret: &str,
    ) -> Result<(), Error> {
        self.resets
            .consume_reset_token(subject, token, new_secret)
            .await
    }

    /// # Errors
    /// See [`RotationEngine::revoke`].
    pub async fn revoke(&self, refresh_credential: &str) -> Result<bool, Error> {
        self.rotation.revoke(refresh_credential).await
    }

    /// # Errors
    /// See [`RotationEngine::revoke_all`].
    pub async fn revoke_all(&self, subject: &SubjectId) -> Result<u64, Error> {
        self.rotation.revoke_all(subject).await
    }

    /// # Errors
    /// See [`RotationEngine::active_sessions`].
    pub async fn active_sessions(&self, subject: &SubjectId) -> Result<usize, Error> {
        self.rotation.active_sessions(subject).await
    }
}
