//! # Tessera (Session Credential Lifecycle)
//!
//! `tessera` issues and rotates the credentials that keep a signed-in subject
//! signed in, and owns the short-lived secrets used to activate accounts and
//! reset passwords.
//!
//! ## Credential Pairs
//!
//! Every sign-in yields a short-lived **access credential** (15 minutes by
//! default) and a long-lived **refresh credential** (7 days). Access
//! credentials are self-contained and never touch the store. Refresh
//! credentials carry a random chain identifier (`jti`) whose registration
//! record must be present in the ephemeral store for the credential to be
//! redeemable.
//!
//! ## Rotation & Reuse Detection
//!
//! Redeeming a refresh credential consumes its registration record before a
//! successor is issued, so a chain never has two live tips. A credential that
//! verifies but has no record was already redeemed (or stolen and replayed):
//! every session of that subject is revoked and the caller must
//! re-authenticate.
//!
//! ## One-Time Secrets
//!
//! - **Activation codes:** 6 digits, 5 minute TTL, at most 3 issuances per
//!   fixed one-hour window per address.
//! - **Password-reset tokens:** 256-bit random strings, 10 minute TTL. A
//!   successful reset revokes every session of the subject.
//!
//! ## Backends
//!
//! Storage, user lookup, and notification delivery sit behind traits
//! ([`store::EphemeralStore`], [`directory::SubjectDirectory`],
//! [`notify::Notifier`]). In-memory implementations back the tests; the
//! PostgreSQL implementations back the `tessera` operator binary.

pub mod cli;
pub mod clock;
pub mod directory;
pub mod notify;
pub mod session;
pub mod store;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
