//! In-memory storage backend.
//!
//! Backed by [`DashMap`]. The kennitala index is claimed through
//! [`DashMap::entry`], so two concurrent inserts of the same code cannot both
//! succeed.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{LoginAuditRecord, LoginAuditStorage, NewUser, StorageError, UserRecord, UserStorage};
use crate::session::Role;

/// Users and login audit records held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    users: DashMap<String, UserRecord>,
    by_code: DashMap<String, String>,
    audit: RwLock<Vec<LoginAuditRecord>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Changes a user's role. Returns `false` if the user does not exist.
    pub fn set_role(&self, user_id: &str, role: Role) -> bool {
        match self.users.get_mut(user_id) {
            Some(mut user) => {
                user.role = role;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all login audit records, oldest first.
    pub async fn login_audits(&self) -> Vec<LoginAuditRecord> {
        self.audit.read().await.clone()
    }
}

#[async_trait]
impl UserStorage for MemoryStorage {
    async fn find_by_personal_code(
        &self,
        personal_code: &str,
    ) -> Result<Option<UserRecord>, StorageError> {
        let Some(id) = self.by_code.get(personal_code).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.get(user_id).map(|user| user.clone()))
    }

    async fn insert(&self, user: &NewUser) -> Result<UserRecord, StorageError> {
        match self.by_code.entry(user.personal_code.clone()) {
            Entry::Occupied(_) => Err(StorageError::conflict(format!(
                "user with personal code {} already exists",
                crate::identity::mask_kennitala(&user.personal_code)
            ))),
            Entry::Vacant(slot) => {
                let record = user.clone().into_record(OffsetDateTime::now_utc());
                // Publish the record before the index entry becomes visible.
                self.users.insert(record.id.clone(), record.clone());
                slot.insert(record.id.clone());
                Ok(record)
            }
        }
    }
}

#[async_trait]
impl LoginAuditStorage for MemoryStorage {
    async fn insert(&self, record: &LoginAuditRecord) -> Result<(), StorageError> {
        self.audit.write().await.push(record.clone());
        Ok(())
    }
}
