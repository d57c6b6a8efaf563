//! OAuth 2.0 identity provider support
//!
//! This module holds the provider-agnostic half of the identity exchange:
//! client configuration, the anti-forgery state carried between login and
//! callback, the token and profile types, and the [`IdentityProvider`] trait
//! the HTTP layer is written against. The Google implementation lives in
//! [`crate::google`].

use crate::error::AuthResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Google's authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google's userinfo endpoint.
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Minimal scopes needed to read the subject's email and display name.
pub const GOOGLE_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// How long a login attempt's state stays valid.
pub const STATE_TTL_SECS: i64 = 600;

/// OAuth client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Redirect URL registered with the provider
    pub redirect_url: String,

    /// Scopes to request
    pub scopes: Vec<String>,

    /// Authorization URL
    pub auth_url: String,

    /// Token URL
    pub token_url: String,

    /// Profile (userinfo) URL
    pub userinfo_url: String,

    /// Timeout for each outbound provider request
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl OAuthConfig {
    /// Configuration for Google with its well-known endpoints.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            scopes: GOOGLE_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Point the client at different endpoints.
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Profile attributes returned by the identity provider.
///
/// Field names follow Google's userinfo v2 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityAssertion {
    /// Provider-specific subject ID
    pub id: String,

    /// Email address
    pub email: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Whether the provider verified the email
    #[serde(default)]
    pub verified_email: bool,

    /// First name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Last name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// Locale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl IdentityAssertion {
    /// Minimal assertion with only the attributes the directory stores.
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            verified_email: false,
            given_name: None,
            family_name: None,
            picture: None,
            locale: None,
        }
    }
}

/// Token response from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// Access token
    pub access_token: String,

    /// Token type (usually "Bearer")
    pub token_type: String,

    /// Expires in seconds
    pub expires_in: Option<u64>,

    /// Refresh token (granted because offline access is requested)
    pub refresh_token: Option<String>,

    /// Granted scopes
    pub scope: Option<String>,
}

impl OAuthTokens {
    /// Bearer token with nothing else attached.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_in: None,
            refresh_token: None,
            scope: None,
        }
    }
}

/// Anti-forgery state for one login attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthState {
    /// Random state value
    pub state: String,

    /// PKCE code verifier
    pub code_verifier: Option<String>,

    /// Created timestamp
    pub created_at: i64,
}

impl OAuthState {
    /// Create a new OAuth state.
    pub fn new() -> Self {
        Self {
            state: random_alphanumeric(32),
            code_verifier: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Create with PKCE support.
    pub fn with_pkce() -> Self {
        let mut state = Self::new();
        state.code_verifier = Some(random_alphanumeric(64));
        state
    }

    /// Get the PKCE S256 code challenge.
    pub fn code_challenge(&self) -> Option<String> {
        use sha2::{Digest, Sha256};

        self.code_verifier.as_ref().map(|verifier| {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            let hash = hasher.finalize();
            base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, hash)
        })
    }

    /// Check if the state has expired.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now - self.created_at > STATE_TTL_SECS
    }

    /// Check a callback's `state` parameter against this attempt.
    pub fn matches(&self, candidate: &str) -> bool {
        !candidate.is_empty() && candidate == self.state && !self.is_expired()
    }
}

impl Default for OAuthState {
    fn default() -> Self {
        Self::new()
    }
}

fn random_alphanumeric(len: usize) -> String {
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// An identity provider the login flow can delegate to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the URL the browser is redirected to.
    fn authorization_url(&self, state: &OAuthState) -> AuthResult<String>;

    /// Exchange an authorization code for provider tokens.
    async fn exchange_code(&self, code: &str, state: &OAuthState) -> AuthResult<OAuthTokens>;

    /// Fetch the subject's profile with a provider access token.
    async fn fetch_profile(&self, access_token: &str) -> AuthResult<IdentityAssertion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_config_defaults() {
        let config = OAuthConfig::google("client-id", "client-secret", "http://localhost/callback");

        assert_eq!(config.auth_url, GOOGLE_AUTH_URL);
        assert_eq!(config.token_url, GOOGLE_TOKEN_URL);
        assert_eq!(config.scopes.len(), 2);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_oauth_state() {
        let state = OAuthState::new();
        assert_eq!(state.state.len(), 32);
        assert!(!state.is_expired());
        assert!(state.code_verifier.is_none());
        assert!(state.code_challenge().is_none());
    }

    #[test]
    fn test_oauth_state_is_random() {
        assert_ne!(OAuthState::new().state, OAuthState::new().state);
    }

    #[test]
    fn test_oauth_state_with_pkce() {
        let state = OAuthState::with_pkce();
        assert_eq!(state.code_verifier.as_ref().map(String::len), Some(64));

        let challenge = state.code_challenge().unwrap();
        assert_eq!(challenge.len(), 43);
        assert!(!challenge.contains('='));
    }

    #[test]
    fn test_pkce_challenge_known_vector() {
        // RFC 7636 appendix B
        let state = OAuthState {
            state: "s".to_string(),
            code_verifier: Some("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string()),
            created_at: chrono::Utc::now().timestamp(),
        };

        assert_eq!(
            state.code_challenge().as_deref(),
            Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM")
        );
    }

    #[test]
    fn test_state_matching() {
        let state = OAuthState::new();

        assert!(state.matches(&state.state.clone()));
        assert!(!state.matches(""));
        assert!(!state.matches("random"));
    }

    #[test]
    fn test_expired_state_never_matches() {
        let mut state = OAuthState::new();
        state.created_at -= STATE_TTL_SECS + 1;

        assert!(state.is_expired());
        assert!(!state.matches(&state.state.clone()));
    }

    #[test]
    fn test_assertion_from_google_json() {
        let assertion: IdentityAssertion = serde_json::from_value(serde_json::json!({
            "id": "1",
            "email": "a@b.com",
            "name": "A",
            "verified_email": true,
            "picture": "https://example.com/a.png",
            "locale": "en"
        }))
        .unwrap();

        assert_eq!(assertion.email, "a@b.com");
        assert!(assertion.verified_email);
        assert_eq!(assertion.locale.as_deref(), Some("en"));
        assert!(assertion.given_name.is_none());
    }
}
