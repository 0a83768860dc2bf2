use crate::clock::SystemClock;
use crate::session::{CredentialVerifier, SigningKeys};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub keys: SigningKeys,
    pub token: SecretString,
}

/// Verify an access credential offline and print its subject.
/// # Errors
/// Returns an error if the credential is invalid or expired.
pub fn execute(args: &Args) -> Result<()> {
    let verifier = CredentialVerifier::new(args.keys.clone(), Arc::new(SystemClock));
    let subject = verifier
        .verify(args.token.expose_secret())
        .context("access credential rejected")?;
    println!("{subject}");
    Ok(())
}
