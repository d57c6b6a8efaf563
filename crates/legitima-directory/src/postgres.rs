//! Postgres-backed user directory
//!
//! Uses a `sqlx` connection pool. The upsert is a single
//! `INSERT ... ON CONFLICT (email)` statement so the database's own
//! uniqueness guarantee is the only synchronisation needed.

use crate::directory::{DirectoryError, DirectoryResult, UserDirectory, UserRecord};
use async_trait::async_trait;
use legitima_auth::IdentityAssertion;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE
)
"#;

// The WHERE clause turns an unchanged name into a no-op, in which case no
// row comes back and the caller falls back to a plain lookup.
const UPSERT_USER: &str = r#"
INSERT INTO users (id, name, email)
VALUES ($1, $2, $3)
ON CONFLICT (email) DO UPDATE
    SET name = EXCLUDED.name
    WHERE users.name IS DISTINCT FROM EXCLUDED.name
RETURNING id, name, email
"#;

const SELECT_USER_BY_EMAIL: &str = "SELECT id, name, email FROM users WHERE email = $1";

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        DirectoryError::StorageUnavailable(err.to_string())
    }
}

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connection string
    pub url: String,

    /// Upper bound on open connections
    pub max_connections: u32,

    /// Connections kept open while idle
    pub min_connections: u32,

    /// How long an idle connection is kept before being closed
    pub idle_timeout: Duration,

    /// How long to wait for a connection, including the initial one
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    /// Settings for `url` with defaults for everything else.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 0,
            idle_timeout: Duration::from_secs(300),
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Set the maximum pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Directory stored in a Postgres `users` table.
#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and check that the database answers.
    pub async fn connect(config: &PoolConfig) -> DirectoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                DirectoryError::StorageUnavailable(format!("error connecting to db: {}", e))
            })?;

        info!(max_connections = config.max_connections, "Database pool ready");
        Ok(Self { pool })
    }

    /// Create the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> DirectoryResult<()> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for PostgresDirectory {
    #[instrument(skip_all, fields(email = %assertion.email))]
    async fn upsert(&self, assertion: &IdentityAssertion) -> DirectoryResult<UserRecord> {
        let written: Option<UserRecord> = sqlx::query_as(UPSERT_USER)
            .bind(Uuid::now_v7().to_string())
            .bind(&assertion.name)
            .bind(&assertion.email)
            .fetch_optional(&self.pool)
            .await?;

        match written {
            Some(record) => Ok(record),
            None => {
                debug!("User unchanged");
                self.find_by_email(&assertion.email).await
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> DirectoryResult<UserRecord> {
        sqlx::query_as(SELECT_USER_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DirectoryError::NotFound(email.to_string()))
    }
}
