//! Login audit storage (`kenni_logins`).

use sqlx_core::query::query;
use uuid::Uuid;

use kenni_auth::storage::LoginAuditRecord;

use crate::{PgPool, StorageError, StorageResult};

/// Append-only login audit operations.
pub struct LoginAuditStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> LoginAuditStorage<'a> {
    /// Create a new login audit storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a login record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidData`] if `user_id` is not a UUID, or
    /// a database error.
    pub async fn insert(&self, record: &LoginAuditRecord) -> StorageResult<()> {
        let user_id = Uuid::parse_str(&record.user_id)
            .map_err(|_| StorageError::invalid_data(format!("user id '{}'", record.user_id)))?;

        query(
            r#"
            INSERT INTO kenni_logins
                (id, user_id, kennital_id, id_token, access_token, user_claims,
                 ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&record.external_subject)
        .bind(&record.id_token)
        .bind(&record.access_token)
        .bind(&record.claims_snapshot)
        .bind(&record.source_ip)
        .bind(&record.user_agent)
        .bind(record.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
