//! Credential pair issuance.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::config::{CredentialConfig, SigningKeys};
use super::error::Error;
use super::token::{self, AccessClaims, CredentialKind, RefreshClaims, TOKEN_VERSION};
use super::utils::generate_token_id;
use crate::clock::Clock;
use crate::directory::SubjectId;
use crate::store::{EphemeralStore, keys};

/// Marker stored in a refresh registration record.
pub const REGISTRATION_MARKER: &str = "valid";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_credential: String,
    pub refresh_credential: String,
}

#[derive(Clone)]
pub struct CredentialIssuer {
    keys: SigningKeys,
    config: CredentialConfig,
    store: Arc<dyn EphemeralStore>,
    clock: Arc<dyn Clock>,
}

impl CredentialIssuer {
    #[must_use]
    pub fn new(
        keys: SigningKeys,
        config: CredentialConfig,
        store: Arc<dyn EphemeralStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            keys,
            config,
            store,
            clock,
        }
    }

    /// Mint a fresh pair and register the refresh credential's chain id.
    ///
    /// No check against existing chains: a subject may hold any number of
    /// concurrent sessions.
    ///
    /// # Errors
    /// Returns [`Error::Store`] if the registration record cannot be written.
    pub async fn issue(&self, subject: &SubjectId) -> Result<CredentialPair, Error> {
        let token_id = generate_token_id().map_err(Error::Entropy)?;
        let now = self.clock.now_unix();

        let access = AccessClaims {
            v: TOKEN_VERSION,
            sub: subject.clone(),
            iat: now,
            exp: now.saturating_add(ttl_as_i64(self.config.access_ttl_seconds())),
        };
        let refresh = RefreshClaims {
            v: TOKEN_VERSION,
            sub: subject.clone(),
            jti: token_id.clone(),
            iat: now,
            exp: now.saturating_add(ttl_as_i64(self.config.refresh_ttl_seconds())),
        };

        let access_credential =
            token::sign_hs256(self.keys.access(), CredentialKind::Access, &access)
                .map_err(signing_error)?;
        let refresh_credential =
            token::sign_hs256(self.keys.refresh(), CredentialKind::Refresh, &refresh)
                .map_err(signing_error)?;

        self.store
            .set_with_expiry(
                &keys::refresh_key(subject, &token_id),
                REGISTRATION_MARKER,
                self.config.refresh_ttl_seconds(),
            )
            .await
            .map_err(Error::Store)?;

        debug!(subject = %subject, "issued credential pair");
        Ok(CredentialPair {
            access_credential,
            refresh_credential,
        })
    }
}

fn ttl_as_i64(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}

fn signing_error(err: token::Error) -> Error {
    match err {
        token::Error::EmptyKey => Error::Configuration("signing key is not set"),
        other => Error::InvalidCredential(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::token::verify_hs256;
    use crate::store::MemoryStore;
    use secrecy::SecretString;

    const NOW: i64 = 1_700_000_000;

    fn issuer(store: Arc<MemoryStore>) -> anyhow::Result<CredentialIssuer> {
        let keys = SigningKeys::new(SecretString::from("access"), SecretString::from("refresh"))?;
        Ok(CredentialIssuer::new(
            keys,
            CredentialConfig::new(),
            store,
            Arc::new(ManualClock::new(NOW)),
        ))
    }

    #[tokio::test]
    async fn issue_registers_refresh_chain() -> anyhow::Result<()> {
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(MemoryStore::with_clock(clock));
        let issuer = issuer(store.clone())?;
        let subject = SubjectId::parse("u1")?;

        let pair = issuer.issue(&subject).await?;

        let access: AccessClaims = verify_hs256(
            &pair.access_credential,
            b"access",
            CredentialKind::Access,
            NOW,
        )?;
        assert_eq!(access.sub, subject);
        assert_eq!(access.exp, NOW + 900);

        let refresh: RefreshClaims = verify_hs256(
            &pair.refresh_credential,
            b"refresh",
            CredentialKind::Refresh,
            NOW,
        )?;
        assert_eq!(refresh.exp, NOW + 604_800);

        let key = keys::refresh_key(&subject, &refresh.jti);
        assert_eq!(store.get(&key).await?.as_deref(), Some(REGISTRATION_MARKER));
        assert_eq!(store.ttl(&key).await?, Some(604_800));
        Ok(())
    }

    #[tokio::test]
    async fn every_issue_opens_a_new_chain() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        let issuer = issuer(store.clone())?;
        let subject = SubjectId::parse("u1")?;

        issuer.issue(&subject).await?;
        issuer.issue(&subject).await?;

        let live = store
            .list_keys_by_prefix(&keys::refresh_prefix(&subject))
            .await?;
        assert_eq!(live.len(), 2);
        Ok(())
    }
}
