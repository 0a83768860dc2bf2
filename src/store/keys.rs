//! Store key namespace. Every key the crate writes is built here.

use crate::directory::SubjectId;

const REFRESH_TOKEN: &str = "refresh_token";
const OTP: &str = "otp";
const OTP_LIMIT: &str = "otp_limit";
const PASSWORD_RESET: &str = "password_reset";

/// Registration record of one refresh credential.
#[must_use]
pub fn refresh_key(subject: &SubjectId, token_id: &str) -> String {
    format!("{REFRESH_TOKEN}:{subject}:{token_id}")
}

/// Prefix matching every registration record of `subject`.
#[must_use]
pub fn refresh_prefix(subject: &SubjectId) -> String {
    format!("{REFRESH_TOKEN}:{subject}:")
}

#[must_use]
pub fn otp_key(address: &str) -> String {
    format!("{OTP}:{address}")
}

#[must_use]
pub fn otp_limit_key(address: &str) -> String {
    format!("{OTP_LIMIT}:{address}")
}

#[must_use]
pub fn password_reset_key(subject: &SubjectId) -> String {
    format!("{PASSWORD_RESET}:{subject}")
}
