//! PostgreSQL storage backend for kenni-auth.
//!
//! Provides persistent storage for:
//!
//! - Users, unique by kennitala (`users`)
//! - Login audit records (`kenni_logins`)
//!
//! The schema is embedded in the binary and applied with [`PostgresAuthStorage::migrate`].
//!
//! # Example
//!
//! ```ignore
//! use kenni_auth_postgres::PostgresAuthStorage;
//!
//! let storage = PostgresAuthStorage::connect("postgres://localhost/acme").await?;
//! storage.migrate().await?;
//!
//! let user = storage.users().find_by_personal_code("1201743399").await?;
//! ```

pub mod login_audit;
pub mod migrations;
pub mod storage_adapters;
pub mod user;

use std::sync::Arc;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use login_audit::LoginAuditStorage;
pub use storage_adapters::{ArcLoginAuditStorage, ArcUserStorage};
pub use user::{UserRow, UserStorage};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Row already exists (unique violation).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be mapped back to a domain type.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Applying the embedded schema failed.
    #[error("Migration failed: {0}")]
    Migration(String),
}

impl StorageError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an `InvalidData` error.
    #[must_use]
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if this is a database error.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for kenni_auth::StorageError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict(msg) => Self::conflict(msg),
            StorageError::InvalidData(msg) => Self::corrupt(msg),
            other => Self::database(other.to_string()),
        }
    }
}

// =============================================================================
// PostgreSQL Auth Storage
// =============================================================================

/// PostgreSQL storage backend for Kenni users and logins.
#[derive(Debug, Clone)]
pub struct PostgresAuthStorage {
    pool: Arc<PgPool>,
}

impl PostgresAuthStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create new storage by connecting to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        use sqlx_core::pool::PoolOptions;
        let pool = PoolOptions::<Postgres>::new().connect(database_url).await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the Arc-wrapped pool.
    #[must_use]
    pub fn pool_arc(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Migration`] if a migration fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        migrations::run(&self.pool).await
    }

    // -------------------------------------------------------------------------
    // Storage Accessors
    // -------------------------------------------------------------------------

    /// Get user storage operations.
    #[must_use]
    pub fn users(&self) -> UserStorage<'_> {
        UserStorage::new(&self.pool)
    }

    /// Get login audit storage operations.
    #[must_use]
    pub fn logins(&self) -> LoginAuditStorage<'_> {
        LoginAuditStorage::new(&self.pool)
    }

    /// Arc-owning user store for [`kenni_auth::IdentityResolver`] and the guards.
    #[must_use]
    pub fn user_store(&self) -> Arc<ArcUserStorage> {
        Arc::new(ArcUserStorage::new(self.pool_arc()))
    }

    /// Arc-owning login audit store for the login flow.
    #[must_use]
    pub fn audit_store(&self) -> Arc<ArcLoginAuditStorage> {
        Arc::new(ArcLoginAuditStorage::new(self.pool_arc()))
    }
}

// =============================================================================
// Tests
// =============================================================================
