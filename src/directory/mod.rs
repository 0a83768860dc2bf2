//! User-storage collaborator: subject identities and the profile snapshot
//! returned alongside rotated credentials.

mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

/// Opaque, immutable identifier of a principal.
///
/// Colons and whitespace are rejected because the identifier is embedded in
/// colon-delimited store keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubjectIdError {
    #[error("subject id is empty")]
    Empty,
    #[error("subject id contains a reserved character")]
    ReservedCharacter,
}

impl SubjectId {
    /// # Errors
    /// Returns an error if the identifier is empty or contains `:` or whitespace.
    pub fn parse(value: impl Into<String>) -> Result<Self, SubjectIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SubjectIdError::Empty);
        }
        if value.chars().any(|ch| ch == ':' || ch.is_whitespace()) {
            return Err(SubjectIdError::ReservedCharacter);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = SubjectIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

/// Minimal, current view of a subject returned by a successful rotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSnapshot {
    pub id: SubjectId,
    pub name: String,
    pub role: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub wallet_balance: f64,
}

/// Sign-in material: who owns an address and the PHC hash of their secret.
#[derive(Clone)]
pub struct StoredSecret {
    pub id: SubjectId,
    pub hashed_secret: String,
}

impl fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSecret")
            .field("id", &self.id)
            .field("hashed_secret", &"***")
            .finish()
    }
}

#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<SubjectSnapshot>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<SubjectSnapshot>>;

    /// Look up the secret of the subject owning `email`. Subjects without a
    /// local secret yield `None`.
    async fn find_secret_by_email(&self, email: &str) -> Result<Option<StoredSecret>>;

    /// Replace the subject's stored secret with an already-hashed value.
    async fn update_secret(&self, id: &SubjectId, hashed_secret: &str) -> Result<()>;

    /// Flag the subject owning `email` as verified. Returns `false` when no
    /// subject owns the address.
    async fn mark_verified(&self, email: &str) -> Result<bool>;
}
