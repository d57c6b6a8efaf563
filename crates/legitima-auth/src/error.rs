//! Error types for authentication operations
//!
//! This module defines the errors that can occur while issuing or verifying
//! session tokens and while talking to the identity provider.

use thiserror::Error;

/// Authentication error types.
///
/// These errors cover session token failures, identity provider failures
/// and configuration problems.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Session token is missing, malformed, mis-signed or has the wrong shape
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token is missing a required claim
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// Signing a session token failed
    #[error("Token signing failed: {0}")]
    SigningFailed(String),

    /// Exchanging the authorization code with the provider failed
    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    /// Fetching or decoding the provider profile failed
    #[error("Profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = AuthError::ExchangeFailed("invalid_grant".to_string());
        assert_eq!(err.to_string(), "Code exchange failed: invalid_grant");

        let err = AuthError::MissingClaim("email".to_string());
        assert_eq!(err.to_string(), "Missing required claim: email");
    }
}
