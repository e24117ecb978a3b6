//! In-memory user directory used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::directory::{DirectoryError, DirectoryResult, UserDirectory};
use crate::model::{CredentialRecord, NewCredential};

#[derive(Default)]
struct Records {
    by_identity: HashMap<String, CredentialRecord>,
    identity_by_email: HashMap<String, String>,
}

/// Process-local directory guarded by a single lock; every operation is atomic.
#[derive(Default)]
pub struct MemoryDirectory {
    records: RwLock<Records>,
}

impl MemoryDirectory {
    /// Construct an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.by_identity.len()
    }

    /// Whether the directory holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_identity(&self, identity: &str) -> DirectoryResult<Option<CredentialRecord>> {
        Ok(self.records.read().await.by_identity.get(identity).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>> {
        let records = self.records.read().await;
        Ok(records
            .identity_by_email
            .get(email)
            .and_then(|identity| records.by_identity.get(identity))
            .cloned())
    }

    async fn insert(&self, record: NewCredential) -> DirectoryResult<CredentialRecord> {
        let mut records = self.records.write().await;
        if records.by_identity.contains_key(&record.identity) {
            return Err(DirectoryError::Duplicate { field: "username" });
        }
        if records.identity_by_email.contains_key(&record.email) {
            return Err(DirectoryError::Duplicate { field: "email" });
        }
        let stored = record.into_record();
        records
            .identity_by_email
            .insert(stored.email.clone(), stored.identity.clone());
        records
            .by_identity
            .insert(stored.identity.clone(), stored.clone());
        Ok(stored)
    }

    async fn set_refresh_token(
        &self,
        identity: &str,
        token: Option<&str>,
    ) -> DirectoryResult<bool> {
        let mut records = self.records.write().await;
        let Some(record) = records.by_identity.get_mut(identity) else {
            return Ok(false);
        };
        record.refresh_token = token.map(str::to_string);
        Ok(true)
    }

    async fn swap_refresh_token(
        &self,
        identity: &str,
        expected: &str,
        next: &str,
    ) -> DirectoryResult<bool> {
        let mut records = self.records.write().await;
        match records.by_identity.get_mut(identity) {
            Some(record) if record.refresh_token.as_deref() == Some(expected) => {
                record.refresh_token = Some(next.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn replace_password_hash(
        &self,
        identity: &str,
        password_hash: &str,
    ) -> DirectoryResult<bool> {
        let mut records = self.records.write().await;
        let Some(record) = records.by_identity.get_mut(identity) else {
            return Ok(false);
        };
        record.password_hash = password_hash.to_string();
        record.refresh_token = None;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use chrono::Utc;

    fn credential(identity: &str, email: &str) -> NewCredential {
        NewCredential {
            identity: identity.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_enforces_both_unique_fields() -> DirectoryResult<()> {
        let directory = MemoryDirectory::new();
        directory.insert(credential("alice", "a@x.com")).await?;

        let same_email = directory.insert(credential("bob", "a@x.com")).await;
        assert!(matches!(
            same_email,
            Err(DirectoryError::Duplicate { field: "email" })
        ));
        let same_identity = directory.insert(credential("alice", "b@x.com")).await;
        assert!(matches!(
            same_identity,
            Err(DirectoryError::Duplicate { field: "username" })
        ));
        assert_eq!(directory.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn identity_lookup_is_case_sensitive() -> DirectoryResult<()> {
        let directory = MemoryDirectory::new();
        directory.insert(credential("alice", "a@x.com")).await?;
        assert!(directory.find_by_identity("alice").await?.is_some());
        assert!(directory.find_by_identity("Alice").await?.is_none());
        assert!(directory.find_by_email("a@x.com").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn swap_only_succeeds_against_current_reference() -> DirectoryResult<()> {
        let directory = MemoryDirectory::new();
        directory.insert(credential("alice", "a@x.com")).await?;

        assert!(!directory.swap_refresh_token("alice", "t1", "t2").await?);
        assert!(directory.set_refresh_token("alice", Some("t1")).await?);
        assert!(directory.swap_refresh_token("alice", "t1", "t2").await?);
        assert!(!directory.swap_refresh_token("alice", "t1", "t3").await?);

        let record = directory.find_by_identity("alice").await?.expect("record");
        assert_eq!(record.refresh_token.as_deref(), Some("t2"));
        Ok(())
    }

    #[tokio::test]
    async fn password_replacement_clears_session() -> DirectoryResult<()> {
        let directory = MemoryDirectory::new();
        directory.insert(credential("alice", "a@x.com")).await?;
        assert!(directory.set_refresh_token("alice", Some("t1")).await?);

        assert!(directory.replace_password_hash("alice", "$argon2id$next").await?);
        let record = directory.find_by_identity("alice").await?.expect("record");
        assert_eq!(record.password_hash, "$argon2id$next");
        assert!(record.refresh_token.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn updates_report_missing_identities() -> DirectoryResult<()> {
        let directory = MemoryDirectory::new();
        assert!(directory.is_empty().await);
        assert!(!directory.set_refresh_token("ghost", None).await?);
        assert!(!directory.replace_password_hash("ghost", "x").await?);
        assert!(!directory.swap_refresh_token("ghost", "a", "b").await?);
        Ok(())
    }
}
