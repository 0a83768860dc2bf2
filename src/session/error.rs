//! Failure taxonomy of the credential core.
//!
//! Nothing in this crate retries. Each variant tells the caller what to do:
//! re-authenticate, re-prompt, wait, or treat the deployment as broken.

use thiserror::Error;

use super::token;
use crate::directory::SubjectId;

#[derive(Debug, Error)]
pub enum Error {
    /// Startup precondition violated (missing signing key).
    #[error("configuration error: {0}")]
    Configuration(&'static str),

    #[error("invalid credential")]
    InvalidCredential(#[source] token::Error),

    /// A verified refresh credential had no live registration. Every session
    /// of the subject has been revoked.
    #[error("refresh credential reuse detected for subject {subject}")]
    ReuseDetected { subject: SubjectId },

    /// Unknown address and wrong secret are reported alike.
    #[error("invalid email or password")]
    InvalidLogin,

    #[error("subject {subject} not found")]
    SubjectNotFound { subject: String },

    #[error("contact address is not a valid email")]
    InvalidAddress,

    #[error("too many code requests, retry in {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("verification code expired")]
    CodeExpired,

    #[error("verification code mismatch")]
    CodeMismatch,

    #[error("reset token is invalid or has expired")]
    TokenInvalid,

    #[error("role {role} is not allowed to access this resource")]
    Forbidden { role: String },

    #[error("ephemeral store failure")]
    Store(#[source] anyhow::Error),

    #[error("subject directory failure")]
    Directory(#[source] anyhow::Error),

    #[error("notification delivery failed")]
    Notification(#[source] anyhow::Error),

    #[error("failed to hash secret")]
    Hash(#[source] anyhow::Error),

    #[error("failed to gather randomness")]
    Entropy(#[source] anyhow::Error),
}

impl Error {
    /// The session is over; the client must sign in again.
    #[must_use]
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential(_) | Self::ReuseDetected { .. } | Self::SubjectNotFound { .. }
        )
    }

    /// The user can fix this by waiting or re-entering input.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress
                | Self::InvalidLogin
                | Self::RateLimited { .. }
                | Self::CodeExpired
                | Self::CodeMismatch
                | Self::TokenInvalid
        )
    }
}
