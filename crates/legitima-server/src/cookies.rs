//! Cookie helpers for the login flow.
//!
//! Two cookies are involved: a signed, short-lived one carrying the pending
//! [`OAuthState`] between `/login` and `/callback`, and the session
//! credential handed out on a successful callback.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::SignedCookieJar;
use legitima_auth::oauth::STATE_TTL_SECS;
use legitima_auth::OAuthState;
use time::Duration;

use crate::state::CookieKey;
use crate::{CALLBACK_PATH, PROFILE_PATH};

/// Name of the cookie holding the session credential.
pub const SESSION_COOKIE_NAME: &str = "Authorization";

const STATE_COOKIE_NAME: &str = "legitima_oauth_state";

/// Create the state cookie for a login attempt.
///
/// The value is `state.verifier.created_at`; all three parts are
/// alphanumeric or numeric, so no escaping is needed.
pub fn state_cookie(state: &OAuthState, secure: bool) -> Cookie<'static> {
    let value = format!(
        "{}.{}.{}",
        state.state,
        state.code_verifier.as_deref().unwrap_or_default(),
        state.created_at
    );

    Cookie::build((STATE_COOKIE_NAME, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(CALLBACK_PATH)
        .max_age(Duration::seconds(STATE_TTL_SECS))
        .build()
}

/// Create the removal cookie for the state cookie.
pub fn clear_state_cookie() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, ""))
        .path(CALLBACK_PATH)
        .max_age(Duration::ZERO)
        .build()
}

/// Get the pending login attempt from a verified jar.
pub fn get_state(jar: &SignedCookieJar<CookieKey>) -> Option<OAuthState> {
    jar.get(STATE_COOKIE_NAME)
        .and_then(|cookie| parse_state(cookie.value()))
}

fn parse_state(value: &str) -> Option<OAuthState> {
    let mut parts = value.split('.');
    let state = parts.next()?.to_string();
    let verifier = parts.next()?;
    let created_at = parts.next()?.parse().ok()?;
    if parts.next().is_some() || state.is_empty() {
        return None;
    }

    Some(OAuthState {
        state,
        code_verifier: (!verifier.is_empty()).then(|| verifier.to_string()),
        created_at,
    })
}

/// Create the session cookie. It is only sent back to `/profile`.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(PROFILE_PATH)
        .build()
}
