//! Storage traits for users and login audit records.
//!
//! # Implementations
//!
//! - [`MemoryStorage`] - in-process backend for tests and local development
//! - `kenni-auth-postgres` - PostgreSQL storage backend

pub mod login_audit;
pub mod memory;
pub mod user;

pub use login_audit::{LoginAuditRecord, LoginAuditStorage};
pub use memory::MemoryStorage;
pub use user::{NewUser, UserRecord, UserStorage};

/// Errors reported by storage backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The stored data could not be mapped back to a record.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The database failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl StorageError {
    /// Creates a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a `Corrupt` error.
    #[must_use]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }

    /// Creates a `Database` error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Returns `true` if a uniqueness constraint was violated.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
