use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::{cookies::SESSION_COOKIE_NAME, error::ApiError, state::AppState};

/// Subject of a verified session credential.
///
/// The credential comes from the `Authorization: Bearer <token>` header
/// when present, otherwise from the `Authorization` cookie, whose value may
/// be the bare token or `Bearer <token>`.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub email: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = credential(parts)?;

        let email = state
            .codec
            .verify(&token)
            .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;

        Ok(SessionUser { email })
    }
}

fn credential(parts: &Parts) -> Result<String, ApiError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthenticated("Authorization header is not ASCII".into()))?;
        return parse_bearer(value)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Unauthenticated("Malformed Authorization header".into()));
    }

    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar
        .get(SESSION_COOKIE_NAME)
        .ok_or_else(|| ApiError::Unauthenticated("No credential presented".into()))?;

    let value = cookie.value();
    let token = if value.contains(' ') {
        parse_bearer(value)
    } else {
        Some(value).filter(|v| !v.is_empty())
    };

    token
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthenticated("Malformed credential cookie".into()))
}

/// Split `Bearer <token>`; exactly one space, non-empty token.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if scheme != "Bearer" || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
