//! # Legitima Authentication
//!
//! This crate provides the two leaf components of the Legitima login flow.
//!
//! ## Overview
//!
//! - **Session tokens**: issuing and verifying the signed credential that
//!   asserts an authenticated subject's email
//! - **Identity exchange**: sending the browser to the identity provider,
//!   exchanging the returned code, and reading the subject's profile
//!
//! ## Features
//!
//! - `jwt` (default): session tokens using jsonwebtoken
//! - `oauth` (default): the Google provider client using oauth2 and reqwest
//!
//! ## Usage
//!
//! ### Session tokens
//!
//! ```rust
//! use legitima_auth::SessionCodec;
//!
//! let codec = SessionCodec::with_secret("your-secret-key").unwrap();
//!
//! let token = codec.issue("user@example.com").unwrap();
//! assert_eq!(codec.verify(&token).unwrap(), "user@example.com");
//! ```
//!
//! ### Identity exchange
//!
//! ```rust,no_run
//! use legitima_auth::{GoogleProvider, IdentityProvider, OAuthConfig, OAuthState};
//!
//! # async fn run() -> legitima_auth::AuthResult<()> {
//! let provider = GoogleProvider::new(OAuthConfig::google(
//!     "client-id",
//!     "client-secret",
//!     "https://your-app.com/callback",
//! ))?;
//!
//! let state = OAuthState::with_pkce();
//! let redirect_to = provider.authorization_url(&state)?;
//!
//! // ...the browser comes back with `code`...
//! let tokens = provider.exchange_code("code", &state).await?;
//! let profile = provider.fetch_profile(&tokens.access_token).await?;
//! println!("{} -> {}", redirect_to, profile.email);
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod error;
#[cfg(feature = "oauth")]
pub mod google;
#[cfg(feature = "jwt")]
pub mod jwt;
pub mod oauth;

// Re-export main types
pub use claims::SessionClaims;
pub use error::{AuthError, AuthResult};
pub use oauth::{IdentityAssertion, IdentityProvider, OAuthConfig, OAuthState, OAuthTokens};

#[cfg(feature = "oauth")]
pub use google::GoogleProvider;

#[cfg(feature = "jwt")]
pub use jwt::{SessionCodec, SessionConfig, SESSION_ALGORITHM};
