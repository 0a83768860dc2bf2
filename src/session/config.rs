//! Signing keys and lifetimes.

use secrecy::{ExposeSecret, SecretString};

use super::error::Error;

const DEFAULT_ACCESS_TTL_SECONDS: u64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_OTP_TTL_SECONDS: u64 = 5 * 60;
const DEFAULT_OTP_WINDOW_SECONDS: u64 = 60 * 60;
const DEFAULT_OTP_MAX_ISSUANCES: i64 = 3;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: u64 = 10 * 60;
const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3000";

/// The two HMAC keys. Access and refresh credentials never share a key
/// namespace: the header `kid` is checked even if the secrets are equal.
#[derive(Clone, Debug)]
pub struct SigningKeys {
    access: SecretString,
    refresh: SecretString,
}

impl SigningKeys {
    /// # Errors
    /// Returns [`Error::Configuration`] if either key is empty.
    pub fn new(access: SecretString, refresh: SecretString) -> Result<Self, Error> {
        if access.expose_secret().trim().is_empty() {
            return Err(Error::Configuration("access signing key is not set"));
        }
        if refresh.expose_secret().trim().is_empty() {
            return Err(Error::Configuration("refresh signing key is not set"));
        }
        Ok(Self { access, refresh })
    }

    pub(crate) fn access(&self) -> &[u8] {
        self.access.expose_secret().as_bytes()
    }

    pub(crate) fn refresh(&self) -> &[u8] {
        self.refresh.expose_secret().as_bytes()
    }
}

#[derive(Clone, Debug)]
pub struct CredentialConfig {
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
    otp_ttl_seconds: u64,
    otp_window_seconds: u64,
    otp_max_issuances: i64,
    reset_token_ttl_seconds: u64,
    frontend_base_url: String,
}

impl CredentialConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            otp_window_seconds: DEFAULT_OTP_WINDOW_SECONDS,
            otp_max_issuances: DEFAULT_OTP_MAX_ISSUANCES,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: u64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: u64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: u64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_window_seconds(mut self, seconds: u64) -> Self {
        self.otp_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_otp_max_issuances(mut self, max: i64) -> Self {
        self.otp_max_issuances = max;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: u64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, url: String) -> Self {
        self.frontend_base_url = url;
        self
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> u64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn otp_ttl_seconds(&self) -> u64 {
        self.otp_ttl_seconds
    }

    #[must_use]
    pub fn otp_window_seconds(&self) -> u64 {
        self.otp_window_seconds
    }

    #[must_use]
    pub fn otp_max_issuances(&self) -> i64 {
        self.otp_max_issuances
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> u64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self::new()
    }
}
