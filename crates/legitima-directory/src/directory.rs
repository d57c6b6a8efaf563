//! User directory abstraction
//!
//! This module defines the user record, the directory error type, and the
//! [`UserDirectory`] trait the HTTP layer depends on. Backends live in
//! sibling modules.

use async_trait::async_trait;
use legitima_auth::IdentityAssertion;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Directory error types.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No record exists for the email
    #[error("User not found: {0}")]
    NotFound(String),

    /// The backing store failed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// A locally known user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct UserRecord {
    /// Internal identifier, stable for the life of the record
    pub id: String,

    /// Display name, refreshed from the provider on every login
    pub name: String,

    /// Email address (natural key)
    pub email: String,
}

impl UserRecord {
    /// Build a record for an email seen for the first time.
    pub fn from_assertion(assertion: &IdentityAssertion) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: assertion.name.clone(),
            email: assertion.email.clone(),
        }
    }
}

/// Storage port for user records.
///
/// Implementations must keep email unique and must never regenerate the id
/// of an existing record.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert a record for a new email, or refresh the name of an existing one.
    ///
    /// Calling this twice with the same assertion is a no-op the second time.
    async fn upsert(&self, assertion: &IdentityAssertion) -> DirectoryResult<UserRecord>;

    /// Look up the record for an email.
    async fn find_by_email(&self, email: &str) -> DirectoryResult<UserRecord>;
}
