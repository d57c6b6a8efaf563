use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, SignedCookieJar};
use legitima_auth::{AuthError, AuthResult, IdentityAssertion, OAuthState};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    cookies,
    error::ApiError,
    state::{AppState, CookieKey},
    PROFILE_PATH,
};

/// Query parameters the provider sends back to `/callback`.
///
/// A repeated parameter keeps its first value.
#[derive(Debug, Default)]
pub struct CallbackQuery {
    pub state: String,
    pub code: String,
}

impl CallbackQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = CallbackQuery::default();
        let (mut seen_state, mut seen_code) = (false, false);

        for (key, value) in pairs {
            match key.as_str() {
                "state" if !seen_state => {
                    query.state = value;
                    seen_state = true;
                }
                "code" if !seen_code => {
                    query.code = value;
                    seen_code = true;
                }
                _ => {}
            }
        }
        query
    }
}

/// Start a login: remember a fresh state in a signed cookie and send the
/// browser to the provider.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: SignedCookieJar<CookieKey>,
) -> Result<Response, ApiError> {
    let attempt = OAuthState::with_pkce();
    let url = state
        .provider
        .authorization_url(&attempt)
        .map_err(ApiError::Upstream)?;

    info!("Redirecting to identity provider");

    let jar = jar.add(cookies::state_cookie(&attempt, state.secure_cookies));
    Ok((StatusCode::FOUND, jar, [(header::LOCATION, url)]).into_response())
}

/// Finish a login: check the state, trade the code for a profile, record
/// the user and hand out a session credential.
///
/// The state cookie is single use and removed whatever the outcome. The
/// removal goes out unsigned so a cookie that failed verification is
/// cleared too.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<Arc<AppState>>,
    jar: SignedCookieJar<CookieKey>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let pending = cookies::get_state(&jar);
    let query = CallbackQuery::from_pairs(pairs);
    let cleared = CookieJar::new().add(cookies::clear_state_cookie());

    match complete_login(&state, pending, &query).await {
        Ok(token) => {
            let cleared = cleared.add(cookies::session_cookie(token, state.secure_cookies));
            (cleared, Redirect::to(PROFILE_PATH)).into_response()
        }
        Err(err) => (cleared, err).into_response(),
    }
}

async fn complete_login(
    state: &AppState,
    pending: Option<OAuthState>,
    query: &CallbackQuery,
) -> Result<String, ApiError> {
    if query.state.is_empty() {
        return Err(ApiError::Validation("missing state".into()));
    }
    let pending = pending
        .filter(|attempt| attempt.matches(&query.state))
        .ok_or_else(|| ApiError::Validation("invalid state".into()))?;
    if query.code.is_empty() {
        return Err(ApiError::Validation("missing code".into()));
    }

    let assertion = tokio::time::timeout(
        state.provider_timeout,
        identify(state, &query.code, &pending),
    )
    .await
    .map_err(|_| {
        ApiError::Upstream(AuthError::ExchangeFailed(format!(
            "identity provider did not answer within {:?}",
            state.provider_timeout
        )))
    })?
    .map_err(ApiError::Upstream)?;

    let record = state
        .directory
        .upsert(&assertion)
        .await
        .map_err(ApiError::Storage)?;

    let token = state
        .codec
        .issue(&assertion.email)
        .map_err(ApiError::Signing)?;

    info!(email = %record.email, user_id = %record.id, "Login completed");
    Ok(token)
}

async fn identify(
    state: &AppState,
    code: &str,
    pending: &OAuthState,
) -> AuthResult<IdentityAssertion> {
    let tokens = state.provider.exchange_code(code, pending).await?;
    state.provider.fetch_profile(&tokens.access_token).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_first_value_wins() {
        let query = CallbackQuery::from_pairs(pairs(&[
            ("state", "first"),
            ("code", "abc"),
            ("state", "second"),
            ("code", "def"),
        ]));

        assert_eq!(query.state, "first");
        assert_eq!(query.code, "abc");
    }

    #[test]
    fn test_absent_parameters_are_empty() {
        let query = CallbackQuery::from_pairs(pairs(&[("scope", "email")]));

        assert!(query.state.is_empty());
        assert!(query.code.is_empty());
    }
}
