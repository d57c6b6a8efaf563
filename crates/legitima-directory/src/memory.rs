//! In-memory user directory
//!
//! Suitable for single-process deployments and tests. Records are lost when
//! the process exits.

use crate::directory::{DirectoryError, DirectoryResult, UserDirectory, UserRecord};
use async_trait::async_trait;
use legitima_auth::IdentityAssertion;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// In-memory directory keyed by email.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    /// Records by email
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl std::fmt::Debug for MemoryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDirectory").finish_non_exhaustive()
    }
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether the directory holds no records.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    #[instrument(skip_all, fields(email = %assertion.email))]
    async fn upsert(&self, assertion: &IdentityAssertion) -> DirectoryResult<UserRecord> {
        // The write lock spans lookup and insert, so concurrent logins for
        // one email end up with a single record.
        let mut users = self.users.write().await;

        let record = users
            .entry(assertion.email.clone())
            .and_modify(|existing| {
                if existing.name != assertion.name {
                    debug!("Updating display name");
                    existing.name = assertion.name.clone();
                }
            })
            .or_insert_with(|| {
                debug!("Creating user record");
                UserRecord::from_assertion(assertion)
            });

        Ok(record.clone())
    }

    async fn find_by_email(&self, email: &str) -> DirectoryResult<UserRecord> {
        self.users
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jojo(name: &str) -> IdentityAssertion {
        IdentityAssertion::new("123", "jojo@gmail.com", name)
    }

    #[tokio::test]
    async fn test_save_user() {
        let directory = MemoryDirectory::new();

        let record = directory.upsert(&jojo("JojO")).await.unwrap();

        assert_eq!(directory.len().await, 1);
        assert_eq!(record.name, "JojO");
        assert_eq!(record.email, "jojo@gmail.com");
    }

    #[tokio::test]
    async fn test_save_user_twice() {
        let directory = MemoryDirectory::new();

        let first = directory.upsert(&jojo("JojO")).await.unwrap();
        let second = directory.upsert(&jojo("JojO")).await.unwrap();

        assert_eq!(directory.len().await, 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_save_user_update_name() {
        let directory = MemoryDirectory::new();

        let first = directory.upsert(&jojo("JojO")).await.unwrap();
        let second = directory.upsert(&jojo("JojO2")).await.unwrap();

        assert_eq!(directory.len().await, 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "JojO2");

        let stored = directory.find_by_email("jojo@gmail.com").await.unwrap();
        assert_eq!(stored.name, "JojO2");
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn test_user_by_email() {
        let directory = MemoryDirectory::new();
        directory.upsert(&jojo("JojO")).await.unwrap();
        directory
            .upsert(&IdentityAssertion::new("456", "other@gmail.com", "Other"))
            .await
            .unwrap();

        let record = directory.find_by_email("jojo@gmail.com").await.unwrap();
        assert_eq!(record.name, "JojO");
        assert_eq!(record.email, "jojo@gmail.com");
    }

    #[tokio::test]
    async fn test_unknown_email_not_found() {
        let directory = MemoryDirectory::new();

        let result = directory.find_by_email("nobody@example.com").await;
        assert!(matches!(result, Err(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_one_record() {
        let directory = MemoryDirectory::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let directory = directory.clone();
                tokio::spawn(async move { directory.upsert(&jojo(&format!("JojO{}", i % 2))).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(directory.len().await, 1);
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
