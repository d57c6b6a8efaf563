//! Google identity provider client.
//!
//! Builds the authorization redirect and performs the code exchange with the
//! `oauth2` crate, then reads the userinfo endpoint with `reqwest`.

use crate::error::{AuthError, AuthResult};
use crate::oauth::{IdentityAssertion, IdentityProvider, OAuthConfig, OAuthState, OAuthTokens};
use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeVerifier, RedirectUrl,
    Scope, TokenResponse, TokenUrl,
};
use reqwest::Client;
use tracing::{debug, instrument, warn};

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleProvider {
    /// OAuth client for the authorization and token endpoints.
    oauth: BasicClient,

    /// HTTP client for the userinfo endpoint.
    http: Client,

    /// Provider configuration.
    config: OAuthConfig,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("client_id", &self.config.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_url", &self.config.auth_url)
            .field("token_url", &self.config.token_url)
            .field("userinfo_url", &self.config.userinfo_url)
            .finish()
    }
}

impl GoogleProvider {
    /// Create a new Google client.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when an endpoint URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(config: OAuthConfig) -> AuthResult<Self> {
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| AuthError::ConfigError(format!("Invalid authorization URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| AuthError::ConfigError(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| AuthError::ConfigError(format!("Invalid redirect URL: {}", e)))?;

        let oauth = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { oauth, http, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &OAuthState) -> AuthResult<String> {
        let csrf = state.state.clone();
        let mut request = self
            .oauth
            .authorize_url(move || CsrfToken::new(csrf))
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline");

        if let Some(challenge) = state.code_challenge() {
            request = request
                .add_extra_param("code_challenge", challenge)
                .add_extra_param("code_challenge_method", "S256");
        }

        let (url, _) = request.url();
        Ok(url.to_string())
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str, state: &OAuthState) -> AuthResult<OAuthTokens> {
        debug!("Exchanging authorization code");

        let mut request = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(verifier) = &state.code_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.clone()));
        }

        let response = tokio::time::timeout(
            self.config.request_timeout,
            request.request_async(async_http_client),
        )
        .await
        .map_err(|_| AuthError::ExchangeFailed("Token endpoint timed out".to_string()))?
        .map_err(|e| {
            warn!("Token exchange rejected: {}", e);
            AuthError::ExchangeFailed(e.to_string())
        })?;

        Ok(OAuthTokens {
            access_token: response.access_token().secret().clone(),
            token_type: response.token_type().as_ref().to_string(),
            expires_in: response.expires_in().map(|d| d.as_secs()),
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            scope: response.scopes().map(|scopes| {
                scopes
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
        })
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, access_token: &str) -> AuthResult<IdentityAssertion> {
        debug!("Fetching userinfo");

        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(e.to_string()))?;

        // Body is drained before the status check.
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(e.to_string()))?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body);
            warn!("Userinfo error ({}): {}", status.as_u16(), message);
            return Err(AuthError::ProfileFetchFailed(format!(
                "Userinfo returned {}",
                status.as_u16()
            )));
        }

        let assertion: IdentityAssertion = serde_json::from_slice(&body)
            .map_err(|e| AuthError::ProfileFetchFailed(format!("Invalid userinfo body: {}", e)))?;

        if assertion.email.is_empty() {
            return Err(AuthError::ProfileFetchFailed(
                "Userinfo response has no email".to_string(),
            ));
        }

        Ok(assertion)
    }
}
