//! # Legitima Directory
//!
//! Local user records for the Legitima login flow, keyed by email.
//!
//! The HTTP layer only sees the [`UserDirectory`] trait; which backend sits
//! behind it is decided at startup.
//!
//! ## Features
//!
//! - `memory` (default): [`MemoryDirectory`], a process-local map
//! - `postgres`: [`PostgresDirectory`], a `users` table behind a sqlx pool
//!
//! ## Usage
//!
//! ```rust
//! use legitima_auth::IdentityAssertion;
//! use legitima_directory::{MemoryDirectory, UserDirectory};
//!
//! # async fn run() -> legitima_directory::DirectoryResult<()> {
//! let directory = MemoryDirectory::new();
//! let assertion = IdentityAssertion::new("1", "a@b.com", "A");
//!
//! let created = directory.upsert(&assertion).await?;
//! let found = directory.find_by_email("a@b.com").await?;
//! assert_eq!(created.id, found.id);
//! # Ok(())
//! # }
//! ```

pub mod directory;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use directory::{DirectoryError, DirectoryResult, UserDirectory, UserRecord};

#[cfg(feature = "memory")]
pub use memory::MemoryDirectory;

#[cfg(feature = "postgres")]
pub use postgres::{PoolConfig, PostgresDirectory};
