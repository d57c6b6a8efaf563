//! # Legitima Server
//!
//! HTTP surface of the login gateway:
//!
//! | Path | Purpose |
//! |---|---|
//! | `GET /` | landing page |
//! | `GET /login` | redirect to Google with a fresh anti-forgery state |
//! | `GET /callback` | complete the login and set the session cookie |
//! | `GET /profile` | the directory record of the authenticated user |
//!
//! [`router`] builds the whole application from an [`AppState`], which is
//! how the integration tests drive it without a network.

pub mod api;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extractors;
pub mod state;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/callback";
pub const PROFILE_PATH: &str = "/profile";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "legitima_server=info,tower_http=info";

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::home::index))
        .route(
            LOGIN_PATH,
            get(api::auth::login).fallback(error::method_not_allowed),
        )
        .route(
            CALLBACK_PATH,
            get(api::auth::callback).fallback(error::method_not_allowed),
        )
        .route(
            PROFILE_PATH,
            get(api::profile::profile).fallback(error::method_not_allowed),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
