//! Server configuration.
//!
//! Everything is read from `LEGITIMA_*` environment variables. Only the
//! OAuth client credentials and the session secret are required; the rest
//! fall back to values suitable for local development.

use legitima_auth::{OAuthConfig, SessionConfig};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REDIRECT_URL: &str = "http://localhost:8080/callback";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Runtime configuration of the gateway.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address
    pub http_addr: SocketAddr,

    /// Google client registration
    pub oauth: OAuthConfig,

    /// Session credential signing
    pub session: SessionConfig,

    /// Postgres connection string; `None` selects the in-memory directory
    pub database_url: Option<String>,

    /// Postgres pool size
    pub db_max_connections: u32,

    /// Upper bound on the code exchange plus profile fetch
    pub provider_timeout: Duration,

    /// Whether cookies carry the `Secure` attribute
    pub secure_cookies: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `LEGITIMA_CLIENT_ID`: Google OAuth client ID
    /// - `LEGITIMA_CLIENT_SECRET`: Google OAuth client secret
    /// - `LEGITIMA_JWT_SECRET`: HMAC key for session credentials
    ///
    /// Optional:
    /// - `LEGITIMA_DATABASE_URL`: Postgres URL (default: in-memory directory)
    /// - `LEGITIMA_HTTP_ADDR`: listen address (default: 0.0.0.0:8080)
    /// - `LEGITIMA_REDIRECT_URL`: OAuth callback URL (default: http://localhost:8080/callback)
    /// - `LEGITIMA_PROVIDER_TIMEOUT_SECS`: provider call bound (default: 10)
    /// - `LEGITIMA_SESSION_TTL_SECS`: credential lifetime (default: no expiry)
    /// - `LEGITIMA_SECURE_COOKIES`: `Secure` cookie attribute (default: true)
    /// - `LEGITIMA_DB_MAX_CONNECTIONS`: Postgres pool size (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| value(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let client_id = required("LEGITIMA_CLIENT_ID")?;
        let client_secret = required("LEGITIMA_CLIENT_SECRET")?;
        let jwt_secret = required("LEGITIMA_JWT_SECRET")?;

        let redirect_url =
            value("LEGITIMA_REDIRECT_URL").unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string());
        let http_addr = parse_addr(
            &value("LEGITIMA_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
        )?;

        let provider_timeout = Duration::from_secs(
            parse_number("LEGITIMA_PROVIDER_TIMEOUT_SECS", value("LEGITIMA_PROVIDER_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
        );
        if provider_timeout.is_zero() {
            return Err(invalid("LEGITIMA_PROVIDER_TIMEOUT_SECS", "must be greater than zero"));
        }

        let mut session = SessionConfig::new(jwt_secret);
        if let Some(ttl) =
            parse_number::<i64>("LEGITIMA_SESSION_TTL_SECS", value("LEGITIMA_SESSION_TTL_SECS"))?
        {
            if ttl <= 0 {
                return Err(invalid("LEGITIMA_SESSION_TTL_SECS", "must be greater than zero"));
            }
            session = session.with_ttl(chrono::Duration::seconds(ttl));
        }

        let secure_cookies = value("LEGITIMA_SECURE_COOKIES")
            .map(|s| s != "false" && s != "0")
            .unwrap_or(true);

        let db_max_connections =
            parse_number("LEGITIMA_DB_MAX_CONNECTIONS", value("LEGITIMA_DB_MAX_CONNECTIONS"))?
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        Ok(Self {
            http_addr,
            oauth: OAuthConfig::google(client_id, client_secret, redirect_url)
                .with_request_timeout(provider_timeout),
            session,
            database_url: value("LEGITIMA_DATABASE_URL"),
            db_max_connections,
            provider_timeout,
            secure_cookies,
        })
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

// Accepts ":8080" as shorthand for every interface.
fn parse_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    let raw = raw.trim();
    let full = if raw.starts_with(':') {
        format!("0.0.0.0{}", raw)
    } else {
        raw.to_string()
    };

    full.parse()
        .map_err(|e: std::net::AddrParseError| invalid("LEGITIMA_HTTP_ADDR", e.to_string()))
}

fn parse_number<T>(key: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|s| s.trim().parse::<T>().map_err(|e| invalid(key, e.to_string())))
        .transpose()
}
