//! Stateless credential verification and the role check built on top of it.

use std::sync::Arc;

use serde::Serialize;

use super::config::SigningKeys;
use super::error::Error;
use super::token::{self, AccessClaims, CredentialKind, RefreshClaims};
use crate::clock::Clock;
use crate::directory::{SubjectId, SubjectSnapshot};

#[derive(Clone)]
pub struct CredentialVerifier {
    keys: SigningKeys,
    clock: Arc<dyn Clock>,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(keys: SigningKeys, clock: Arc<dyn Clock>) -> Self {
        Self { keys, clock }
    }

    /// Signature and expiry check of an access credential. No store access.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCredential`] for any shape, signature, kind or
    /// expiry failure.
    pub fn verify(&self, access_credential: &str) -> Result<SubjectId, Error> {
        let claims: AccessClaims = token::verify_hs256(
            access_credential,
            self.keys.access(),
            CredentialKind::Access,
            self.clock.now_unix(),
        )
        .map_err(Error::InvalidCredential)?;
        Ok(claims.sub)
    }

    pub(crate) fn verify_refresh(&self, refresh_credential: &str) -> Result<RefreshClaims, Error> {
        token::verify_hs256(
            refresh_credential,
            self.keys.refresh(),
            CredentialKind::Refresh,
            self.clock.now_unix(),
        )
        .map_err(Error::InvalidCredential)
    }

    /// Signature-only check, used by logout so lapsed sessions can still be
    /// cleaned up.
    pub(crate) fn decode_refresh(&self, refresh_credential: &str) -> Result<RefreshClaims, Error> {
        token::decode_hs256(refresh_credential, self.keys.refresh(), CredentialKind::Refresh)
            .map_err(Error::InvalidCredential)
    }
}

/// A verified caller, passed explicitly down to whatever needs it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Principal {
    pub subject: SubjectSnapshot,
}

impl Principal {
    #[must_use]
    pub fn id(&self) -> &SubjectId {
        &self.subject.id
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.subject.role
    }
}

/// Single equality test of the principal's role against `allowed_roles`.
///
/// # Errors
/// Returns [`Error::Forbidden`] when the role is not listed.
pub fn authorize(principal: &Principal, allowed_roles: &[&str]) -> Result<(), Error> {
    if allowed_roles.iter().any(|allowed| *allowed == principal.role()) {
        Ok(())
    } else {
        Err(Error::Forbidden {
            role: principal.role().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::token::{TOKEN_VERSION, sign_hs256};
    use secrecy::SecretString;

    const NOW: i64 = 1_700_000_000;

    fn verifier(clock: Arc<ManualClock>) -> anyhow::Result<CredentialVerifier> {
        let keys = SigningKeys::new(SecretString::from("access"), SecretString::from("refresh"))?;
        Ok(CredentialVerifier::new(keys, clock))
    }

    fn principal(role: &str) -> anyhow::Result<Principal> {
        Ok(Principal {
            subject: SubjectSnapshot {
                id: SubjectId::parse("u1")?,
                name: "Ada".to_string(),
                role: role.to_string(),
                email: "a@x.com".to_string(),
                avatar: None,
                wallet_balance: 0.0,
            },
        })
    }

    #[test]
    fn verify_honours_the_clock() -> anyhow::Result<()> {
        let clock = Arc::new(ManualClock::new(NOW));
        let verifier = verifier(clock.clone())?;
        let claims = AccessClaims {
            v: TOKEN_VERSION,
            sub: SubjectId::parse("u1")?,
            iat: NOW,
            exp: NOW + 60,
        };
        let credential = sign_hs256(b"access", CredentialKind::Access, &claims)?;

        assert_eq!(verifier.verify(&credential)?.as_str(), "u1");

        clock.advance(60);
        assert!(matches!(
            verifier.verify(&credential),
            Err(Error::InvalidCredential(token::Error::Expired))
        ));
        Ok(())
    }

    #[test]
    fn refresh_credential_is_not_an_access_credential() -> anyhow::Result<()> {
        let verifier = verifier(Arc::new(ManualClock::new(NOW)))?;
        let claims = RefreshClaims {
            v: TOKEN_VERSION,
            sub: SubjectId::parse("u1")?,
            jti: "t".to_string(),
            iat: NOW,
            exp: NOW + 60,
        };
        let credential = sign_hs256(b"refresh", CredentialKind::Refresh, &claims)?;

        assert!(matches!(
            verifier.verify(&credential),
            Err(Error::InvalidCredential(_))
        ));
        assert!(verifier.verify_refresh(&credential).is_ok());
        Ok(())
    }

    #[test]
    fn decode_refresh_accepts_lapsed_credentials() -> anyhow::Result<()> {
        let verifier = verifier(Arc::new(ManualClock::new(NOW)))?;
        let claims = RefreshClaims {
            v: TOKEN_VERSION,
            sub: SubjectId::parse("u1")?,
            jti: "t".to_string(),
            iat: NOW - 120,
            exp: NOW - 60,
        };
        let credential = sign_hs256(b"refresh", CredentialKind::Refresh, &claims)?;

        assert!(verifier.verify_refresh(&credential).is_err());
        assert_eq!(verifier.decode_refresh(&credential)?.jti, "t");
        Ok(())
    }

    #[test]
    fn authorize_is_an_equality_check() -> anyhow::Result<()> {
        assert!(authorize(&principal("admin")?, &["admin"]).is_ok());
        assert!(authorize(&principal("user")?, &["admin", "user"]).is_ok());
        assert!(matches!(
            authorize(&principal("Admin")?, &["admin"]),
            Err(Error::Forbidden { role }) if role == "Admin"
        ));
        Ok(())
    }
}
