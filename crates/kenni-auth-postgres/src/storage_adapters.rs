//! Arc-owning storage adapters.
//!
//! These wrap the lifetime-based storage types and own an `Arc<PgPool>`, so
//! they can be handed to kenni-auth as `Arc<dyn UserStorage>` and
//! `Arc<dyn LoginAuditStorage>`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use kenni_auth::storage::{
    LoginAuditRecord, LoginAuditStorage as LoginAuditStorageTrait, NewUser,
    StorageError as AuthStorageError, UserRecord, UserStorage as UserStorageTrait,
};

use crate::PgPool;
use crate::login_audit::LoginAuditStorage;
use crate::user::{UserRow, UserStorage};

fn to_record(row: Option<UserRow>) -> Result<Option<UserRecord>, AuthStorageError> {
    row.map(UserRow::into_record).transpose().map_err(Into::into)
}

// =============================================================================
// Arc-Owning User Storage
// =============================================================================

/// Arc-owning PostgreSQL user storage adapter.
#[derive(Clone)]
pub struct ArcUserStorage {
    pool: Arc<PgPool>,
}

impl ArcUserStorage {
    /// Create a new Arc-owning user storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorageTrait for ArcUserStorage {
    async fn find_by_personal_code(
        &self,
        personal_code: &str,
    ) -> Result<Option<UserRecord>, AuthStorageError> {
        let storage = UserStorage::new(&self.pool);
        to_record(storage.find_by_personal_code(personal_code).await?)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, AuthStorageError> {
        // Ids are minted here as UUIDs; anything else cannot exist.
        let Ok(id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };
        let storage = UserStorage::new(&self.pool);
        to_record(storage.find_by_id(id).await?)
    }

    async fn insert(&self, user: &NewUser) -> Result<UserRecord, AuthStorageError> {
        let storage = UserStorage::new(&self.pool);
        Ok(storage.create(user).await?.into_record()?)
    }
}

impl std::fmt::Debug for ArcUserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcUserStorage").finish_non_exhaustive()
    }
}

// =============================================================================
// Arc-Owning Login Audit Storage
// =============================================================================

/// Arc-owning PostgreSQL login audit adapter.
#[derive(Clone)]
pub struct ArcLoginAuditStorage {
    pool: Arc<PgPool>,
}

impl ArcLoginAuditStorage {
    /// Create a new Arc-owning login audit storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginAuditStorageTrait for ArcLoginAuditStorage {
    async fn insert(&self, record: &LoginAuditRecord) -> Result<(), AuthStorageError> {
        let storage = LoginAuditStorage::new(&self.pool);
        storage.insert(record).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ArcLoginAuditStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcLoginAuditStorage").finish_non_exhaustive()
    }
}
