use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use legitima_auth::{AuthResult, GoogleProvider, IdentityProvider, SessionCodec};
use legitima_directory::UserDirectory;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Shared application state
pub struct AppState {
    pub codec: SessionCodec,
    pub provider: Arc<dyn IdentityProvider>,
    pub directory: Arc<dyn UserDirectory>,
    pub provider_timeout: Duration,
    pub secure_cookies: bool,
    cookie_key: CookieKey,
}

impl AppState {
    /// Assemble state from its parts with default request settings.
    pub fn new(
        codec: SessionCodec,
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let cookie_key = derive_cookie_key(&codec.config().secret);

        Self {
            codec,
            provider,
            directory,
            provider_timeout: Duration::from_secs(10),
            secure_cookies: true,
            cookie_key,
        }
    }

    /// Build the production state: Google as provider, `directory` as storage.
    pub fn from_config(config: &Config, directory: Arc<dyn UserDirectory>) -> AuthResult<Self> {
        let codec = SessionCodec::new(config.session.clone())?;
        let provider = Arc::new(GoogleProvider::new(config.oauth.clone())?);

        Ok(Self::new(codec, provider, directory)
            .with_provider_timeout(config.provider_timeout)
            .with_secure_cookies(config.secure_cookies))
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

/// Key for the signed cookie jar.
#[derive(Clone)]
pub struct CookieKey(Key);

impl From<CookieKey> for Key {
    fn from(key: CookieKey) -> Self {
        key.0
    }
}

impl FromRef<Arc<AppState>> for CookieKey {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.cookie_key.clone()
    }
}

// Cookie signing needs 64 bytes of key material; SHA-512 of the session
// secret gives exactly that.
fn derive_cookie_key(secret: &str) -> CookieKey {
    let digest = Sha512::digest(secret.as_bytes());
    CookieKey(Key::from(digest.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_key_is_stable_per_secret() {
        let a = derive_cookie_key("secret");
        let b = derive_cookie_key("secret");
        let c = derive_cookie_key("other");

        assert_eq!(a.0.signing(), b.0.signing());
        assert_ne!(a.0.signing(), c.0.signing());
    }
}
