//! Session token claims
//!
//! The session credential asserts exactly one thing: the email of the
//! subject that completed the OAuth callback. Issuer and issue time ride
//! along as standard claims; expiry is present only when a session TTL is
//! configured.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried by a session credential.
///
/// # Example
///
/// ```rust
/// use legitima_auth::claims::SessionClaims;
///
/// let claims = SessionClaims::new("user@example.com", "legitima", None);
/// assert_eq!(claims.email, "user@example.com");
/// assert!(claims.exp.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Authenticated subject's email
    pub email: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl SessionClaims {
    /// Create claims for `email`, expiring after `ttl` when one is given.
    pub fn new(email: impl Into<String>, issuer: impl Into<String>, ttl: Option<Duration>) -> Self {
        let now = Utc::now();

        Self {
            email: email.into(),
            iss: issuer.into(),
            iat: now.timestamp(),
            exp: ttl.map(|ttl| (now + ttl).timestamp()),
        }
    }
}
