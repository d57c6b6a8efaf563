//! HTTP error type.
//!
//! Every failed request ends in an [`ApiError`]. The client only ever sees a
//! short message; the underlying error is logged with the request span
//! (method and URI come from the trace layer).

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use legitima_auth::AuthError;
use legitima_directory::DirectoryError;
use serde::Serialize;

/// JSON error body: `{"error": {"message": "..."}}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub message: String,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Identity provider failure: {0}")]
    Upstream(AuthError),

    #[error("Directory failure: {0}")]
    Storage(DirectoryError),

    #[error("Credential signing failure: {0}")]
    Signing(AuthError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) | ApiError::Storage(_) | ApiError::Signing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the client.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Unauthenticated(_) => "unauthorized".to_string(),
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::Upstream(_) | ApiError::Storage(_) | ApiError::Signing(_) => {
                "internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                message: self.client_message(),
            },
        });

        if matches!(self, ApiError::MethodNotAllowed) {
            return (status, [(header::ALLOW, "GET, HEAD")], body).into_response();
        }

        (status, body).into_response()
    }
}

/// Fallback for routes that only answer `GET`.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
