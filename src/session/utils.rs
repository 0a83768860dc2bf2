//! Small helpers for address handling, random material and secret hashing.

use anyhow::{Context, Result};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{Rng, RngCore, rngs::OsRng};
use regex::Regex;
use subtle::ConstantTimeEq;
use url::Url;

const TOKEN_ID_BYTES: usize = 16;
const RESET_TOKEN_BYTES: usize = 32;

/// Normalize a contact address so store keys do not depend on casing.
pub(super) fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_address(address_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(address_normalized))
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to read from the OS random source")?;
    Ok(bytes)
}

/// Chain identifier for a refresh credential (128 bits, base64url).
pub(super) fn generate_token_id() -> Result<String> {
    let bytes = random_bytes::<TOKEN_ID_BYTES>()?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Password-reset token (256 bits, base64url) safe to embed in a query string.
pub(super) fn generate_reset_token() -> Result<String> {
    let bytes = random_bytes::<RESET_TOKEN_BYTES>()?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Uniform 6-digit activation code.
pub(super) fn generate_code() -> String {
    OsRng.gen_range(100_000..=999_999_u32).to_string()
}

pub(super) fn constant_time_eq(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Hash a new account secret into an Argon2id PHC string.
pub(super) fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|_| anyhow::anyhow!("failed to hash secret"))?
        .to_string();
    Ok(hash)
}

/// Check a presented secret against a stored PHC string. A malformed hash
/// never matches.
pub(super) fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Build the frontend reset link included in outbound emails.
pub(super) fn build_reset_url(
    frontend_base_url: &str,
    token: &str,
    subject: &str,
) -> Result<String> {
    let base = frontend_base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{base}/reset-password"))
        .with_context(|| format!("invalid frontend base url: {frontend_base_url}"))?;
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("id", subject);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_address_trims_and_lowercases() {
        assert_eq!(normalize_address(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_address_rejects_missing_parts() {
        assert!(valid_address("a@x.com"));
        assert!(!valid_address("not-an-address"));
        assert!(!valid_address("missing-domain@"));
        assert!(!valid_address("two words@x.com"));
    }

    #[test]
    fn token_id_carries_128_bits() -> Result<()> {
        let token_id = generate_token_id()?;
        let decoded =
            Base64UrlUnpadded::decode_vec(&token_id).map_err(|_| anyhow::anyhow!("base64"))?;
        assert_eq!(decoded.len(), TOKEN_ID_BYTES);
        assert_ne!(token_id, generate_token_id()?);
        Ok(())
    }

    #[test]
    fn reset_token_carries_256_bits() -> Result<()> {
        let token = generate_reset_token()?;
        let decoded =
            Base64UrlUnpadded::decode_vec(&token).map_err(|_| anyhow::anyhow!("base64"))?;
        assert_eq!(decoded.len(), RESET_TOKEN_BYTES);
        assert!(!token.contains(['+', '/', '=']));
        Ok(())
    }

    #[test]
    fn code_stays_in_six_digits() {
        for _ in 0..1_000 {
            let code = generate_code();
            assert_eq!(code.len(), 6, "{code}");
            assert!(!code.starts_with('0'), "{code}");
        }
    }

    #[test]
    fn constant_time_eq_matches_plain_equality() {
        assert!(constant_time_eq("123456", "123456"));
        assert!(!constant_time_eq("123456", "123457"));
        assert!(!constant_time_eq("123456", "12345"));
    }

    #[test]
    fn hash_secret_produces_argon2id_phc() -> Result<()> {
        let hash = hash_secret("hunter2")?;
        assert!(hash.starts_with("$argon2id$"));
        let parsed = PasswordHash::new(&hash).map_err(|_| anyhow::anyhow!("phc"))?;
        assert!(Argon2::default().verify_password(b"hunter2", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"hunter3", &parsed).is_err());
        Ok(())
    }

    #[test]
    fn verify_secret_checks_phc_string() -> Result<()> {
        let hash = hash_secret("hunter2")?;
        assert!(verify_secret("hunter2", &hash));
        assert!(!verify_secret("hunter3", &hash));
        assert!(!verify_secret("hunter2", "not-a-phc-string"));
        Ok(())
    }

    #[test]
    fn build_reset_url_encodes_query() -> Result<()> {
        let url = build_reset_url("https://shop.example/", "abc", "u1")?;
        assert_eq!(url, "https://shop.example/reset-password?token=abc&id=u1");
        assert!(build_reset_url("not a url", "abc", "u1").is_err());
        Ok(())
    }
}
