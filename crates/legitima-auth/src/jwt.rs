//! Session token issuance and verification
//!
//! This module signs and verifies session credentials with the jsonwebtoken
//! crate. Credentials are HS256-signed with a secret only this service knows.
//! The algorithm is pinned on verification; whatever a token's header claims
//! is never used to pick the verification method.

use crate::claims::SessionClaims;
use crate::error::{AuthError, AuthResult};
use chrono::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};

/// The only algorithm session credentials are issued and accepted with.
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Session token configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret key for HMAC signing
    pub secret: String,

    /// Token issuer
    pub issuer: String,

    /// Lifetime of issued credentials; `None` issues credentials without `exp`
    pub session_ttl: Option<Duration>,
}

impl SessionConfig {
    /// Configuration with the default issuer and no expiry.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "legitima".to_string(),
            session_ttl: None,
        }
    }

    /// Set the credential lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }
}

/// Signs and verifies session credentials.
pub struct SessionCodec {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("issuer", &self.config.issuer)
            .field("session_ttl", &self.config.session_ttl)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl SessionCodec {
    /// Create a codec from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the secret is empty.
    pub fn new(config: SessionConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::ConfigError(
                "Session signing secret must not be empty".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a secret and default settings.
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(SessionConfig::new(secret))
    }

    /// Issue a session credential asserting `email`.
    pub fn issue(&self, email: &str) -> AuthResult<String> {
        let claims = SessionClaims::new(email, &self.config.issuer, self.config.session_ttl);
        self.encode_claims(&claims)
    }

    /// Sign existing claims.
    pub fn encode_claims(&self, claims: &SessionClaims) -> AuthResult<String> {
        let header = Header::new(SESSION_ALGORITHM);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningFailed(e.to_string()))
    }

    /// Verify a credential and return the email it asserts.
    pub fn verify(&self, token: &str) -> AuthResult<String> {
        let claims = self.verify_claims(token)?;
        Ok(claims.email)
    }

    /// Verify a credential and return all of its claims.
    pub fn verify_claims(&self, token: &str) -> AuthResult<SessionClaims> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken("Empty token".to_string()));
        }

        let token_data: TokenData<SessionClaims> = decode(token, &self.decoding_key, &self.validation())
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::InvalidToken("Token expired".to_string()),
                    ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                        AuthError::InvalidToken("Malformed token".to_string())
                    }
                    ErrorKind::InvalidSignature => {
                        AuthError::InvalidToken("Invalid signature".to_string())
                    }
                    ErrorKind::InvalidAlgorithm => {
                        AuthError::InvalidToken("Unexpected signing algorithm".to_string())
                    }
                    ErrorKind::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
                    ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
                    ErrorKind::Json(_) => AuthError::InvalidToken("Unexpected claim shape".to_string()),
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        if token_data.claims.email.is_empty() {
            return Err(AuthError::MissingClaim("email".to_string()));
        }

        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[&self.config.issuer]);
        if self.config.session_ttl.is_some() {
            validation.set_required_spec_claims(&["exp", "iss"]);
        } else {
            // exp is still checked when a token carries one
            validation.set_required_spec_claims(&["iss"]);
        }
        validation
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_secret() -> String {
        "test-secret-key-for-jwt-signing-minimum-32-chars".to_string()
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();

        let token = codec.issue("test@example.com").unwrap();
        let email = codec.verify(&token).unwrap();

        assert_eq!(email, "test@example.com");
    }

    #[test]
    fn test_round_trip_for_assorted_emails() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();

        for email in ["a@b.com", "jj@gmail.com", "first.last+tag@sub.example.org", "ü@例え.jp"] {
            let token = codec.issue(email).unwrap();
            assert_eq!(codec.verify(&token).unwrap(), email);
        }
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = SessionCodec::with_secret("");
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_token() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();

        assert!(matches!(codec.verify("invalid-token"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(codec.verify(""), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = SessionCodec::with_secret(test_secret()).unwrap();
        let theirs = SessionCodec::with_secret("some-other-secret-entirely").unwrap();

        let token = theirs.issue("test@example.com").unwrap();
        let result = ours.verify(&token);

        assert!(matches!(result, Err(AuthError::InvalidToken(msg)) if msg == "Invalid signature"));
    }

    #[test]
    fn test_other_algorithm_rejected_even_with_same_secret() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();
        let claims = SessionClaims::new("test@example.com", "legitima", None);

        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(test_secret().as_bytes()),
        )
        .unwrap();

        let result = codec.verify(&token);
        assert!(
            matches!(result, Err(AuthError::InvalidToken(msg)) if msg == "Unexpected signing algorithm")
        );
    }

    #[test]
    fn test_missing_email_claim_rejected() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();
        let claims = serde_json::json!({
            "iss": "legitima",
            "iat": Utc::now().timestamp(),
            "sub": "123",
        });

        let token = encode(
            &Header::new(SESSION_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(test_secret().as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_empty_email_claim_rejected() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();
        let token = codec
            .encode_claims(&SessionClaims::new("", "legitima", None))
            .unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::MissingClaim(_))));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();
        let token = codec
            .encode_claims(&SessionClaims::new("test@example.com", "someone-else", None))
            .unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_ttl_embeds_expiry() {
        let codec =
            SessionCodec::new(SessionConfig::new(test_secret()).with_ttl(Duration::hours(1))).unwrap();

        let token = codec.issue("test@example.com").unwrap();
        let claims = codec.verify_claims(&token).unwrap();

        assert!(claims.exp.unwrap() > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();

        let mut claims = SessionClaims::new("test@example.com", "legitima", None);
        claims.exp = Some(Utc::now().timestamp() - 3600);
        let token = codec.encode_claims(&claims).unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_recently_expired_token_rejected() {
        let codec =
            SessionCodec::new(SessionConfig::new(test_secret()).with_ttl(Duration::hours(1))).unwrap();

        let mut claims = SessionClaims::new("test@example.com", "legitima", None);
        claims.exp = Some(Utc::now().timestamp() - 5);
        let token = codec.encode_claims(&claims).unwrap();

        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidToken(msg)) if msg == "Token expired"));
    }

    #[test]
    fn test_ttl_config_requires_exp() {
        let issuer = SessionCodec::with_secret(test_secret()).unwrap();
        let strict =
            SessionCodec::new(SessionConfig::new(test_secret()).with_ttl(Duration::hours(1))).unwrap();

        let token = issuer.issue("test@example.com").unwrap();
        assert!(matches!(strict.verify(&token), Err(AuthError::MissingClaim(_))));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let codec = SessionCodec::with_secret(test_secret()).unwrap();
        let debug = format!("{:?}", codec);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&test_secret()));
    }
}
