//! Login audit storage.
//!
//! One record is appended per successful federated login. Records are never
//! read back by this crate.

use async_trait::async_trait;
use time::OffsetDateTime;

use super::StorageError;

/// A successful login, as recorded for audit.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginAuditRecord {
    /// The local user id.
    pub user_id: String,

    /// The provider's subject identifier.
    pub external_subject: String,

    /// The raw ID token.
    pub id_token: String,

    /// The raw access token.
    pub access_token: String,

    /// All ID token claims.
    pub claims_snapshot: serde_json::Value,

    /// Client address, or `"unknown"`.
    pub source_ip: String,

    /// Client user agent, or `"unknown"`.
    pub user_agent: String,

    /// When the login completed.
    pub created_at: OffsetDateTime,
}

/// Append-only storage for login audit records.
#[async_trait]
pub trait LoginAuditStorage: Send + Sync {
    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn insert(&self, record: &LoginAuditRecord) -> Result<(), StorageError>;
}
