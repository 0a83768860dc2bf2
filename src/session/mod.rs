//! Session-credential lifecycle: pair issuance, refresh rotation with reuse
//! detection, activation codes, password-reset tokens and access
//! verification.
//!
//! All time-bounded state lives in an [`EphemeralStore`](crate::store::EphemeralStore);
//! no component holds locks across operations. Exclusivity comes from the
//! store's per-key atomic operations only.

mod config;
mod error;
mod issuer;
mod otp;
mod reset;
mod rotation;
mod service;
pub mod token;
mod utils;
mod verifier;

pub use config::{CredentialConfig, SigningKeys};
pub use error::Error;
pub use issuer::{CredentialIssuer, CredentialPair, REGISTRATION_MARKER};
pub use otp::CodeService;
pub use reset::ResetService;
pub use rotation::{Rotation, RotationEngine};
pub use service::CredentialService;
pub use verifier::{CredentialVerifier, Principal, authorize};
