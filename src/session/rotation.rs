//! Refresh rotation with reuse detection.
//!
//! A refresh credential is `ISSUED` while its registration record exists.
//! Redeeming it deletes the record first and only then issues a successor,
//! so there is never a moment where both the old and the new credential are
//! redeemable. Consumption is the store's single-key delete: the caller that
//! observes `1` removed entry owns the transition, everyone else sees the
//! credential as already spent.
//!
//! The subject lookup runs before the delete. A directory failure then
//! leaves the record in place and the client can retry with the same
//! credential.
//!
//! A credential that verifies but has no record is a replay. The engine can
//! not tell a legitimate retry from a thief, so it revokes every session of
//! the subject and reports [`Error::ReuseDetected`].
//!
//! An expired credential fails signature verification before the store is
//! consulted and never triggers revocation: unused sessions simply lapse.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::Error;
use super::issuer::{CredentialIssuer, CredentialPair};
use super::verifier::CredentialVerifier;
use crate::directory::{SubjectDirectory, SubjectId, SubjectSnapshot};
use crate::store::{EphemeralStore, keys};

/// Result of a successful rotation: the successor pair and a fresh profile
/// snapshot for the client cache.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rotation {
    #[serde(flatten)]
    pub credentials: CredentialPair,
    pub subject: SubjectSnapshot,
}

#[derive(Clone)]
pub struct RotationEngine {
    issuer: CredentialIssuer,
    verifier: CredentialVerifier,
    store: Arc<dyn EphemeralStore>,
    directory: Arc<dyn SubjectDirectory>,
}

impl RotationEngine {
    #[must_use]
    pub fn new(
        issuer: CredentialIssuer,
        verifier: CredentialVerifier,
        store: Arc<dyn EphemeralStore>,
        directory: Arc<dyn SubjectDirectory>,
    ) -> Self {
        Self {
            issuer,
            verifier,
            store,
            directory,
        }
    }

    /// Redeem a refresh credential for a new pair.
    ///
    /// # Errors
    /// - [`Error::InvalidCredential`] if the credential is malformed, forged or expired.
    /// - [`Error::ReuseDetected`] if it was already redeemed or revoked; all
    ///   sessions of the subject are gone afterwards.
    /// - [`Error::SubjectNotFound`] if the subject was deleted mid-session.
    pub async fn rotate(&self, refresh_credential: &str) -> Result<Rotation, Error> {
        let claims = self.verifier.verify_refresh(refresh_credential)?;
        let subject = claims.sub;

        let snapshot = self
            .directory
            .find_by_id(&subject)
            .await
            .map_err(Error::Directory)?
            .ok_or_else(|| Error::SubjectNotFound {
                subject: subject.to_string(),
            })?;

        let consumed = self
            .store
            .delete(&[keys::refresh_key(&subject, &claims.jti)])
            .await
            .map_err(Error::Store)?;
        if consumed == 0 {
            warn!(subject = %subject, "refresh credential reuse detected");
            self.revoke_all(&subject).await?;
            return Err(Error::ReuseDetected { subject });
        }

        let credentials = self.issuer.issue(&subject).await?;
        debug!(subject = %subject, "rotated refresh credential");
        Ok(Rotation {
            credentials,
            subject: snapshot,
        })
    }

    /// Logout: drop the registration record of one refresh credential.
    ///
    /// Expiry is not checked so a lapsed credential can still be logged out.
    /// Returns whether a live record was removed; repeating the call is
    /// harmless.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCredential`] if the signature does not verify.
    pub async fn revoke(&self, refresh_credential: &str) -> Result<bool, Error> {
        let claims = self.verifier.decode_refresh(refresh_credential)?;
        let removed = self
            .store
            .delete(&[keys::refresh_key(&claims.sub, &claims.jti)])
            .await
            .map_err(Error::Store)?;
        debug!(subject = %claims.sub, removed, "revoked refresh credential");
        Ok(removed > 0)
    }

    /// Revoke every session of `subject`. Not atomic as a whole; re-running
    /// finishes a partially completed revocation.
    ///
    /// # Errors
    /// Returns [`Error::Store`] if listing or deleting fails.
    pub async fn revoke_all(&self, subject: &SubjectId) -> Result<u64, Error> {
        let live = self
            .store
            .list_keys_by_prefix(&keys::refresh_prefix(subject))
            .await
            .map_err(Error::Store)?;
        if live.is_empty() {
            return Ok(0);
        }
        let revoked = self.store.delete(&live).await.map_err(Error::Store)?;
        warn!(subject = %subject, revoked, "revoked all sessions");
        Ok(revoked)
    }

    /// Number of live refresh registrations, one per active session.
    ///
    /// # Errors
    /// Returns [`Error::Store`] if the store cannot be listed.
    pub async fn active_sessions(&self, subject: &SubjectId) -> Result<usize, Error> {
        let live = self
            .store
            .list_keys_by_prefix(&keys::refresh_prefix(subject))
            .await
            .map_err(Error::Store)?;
        Ok(live.len())
    }
}
