//! User storage.
//!
//! One row per kennitala. The `users_personal_code_key` unique constraint
//! makes concurrent first logins for the same person race safely: the loser
//! gets [`StorageError::Conflict`].

use sqlx_core::query_as::query_as;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use kenni_auth::identity::{KennitalaKind, mask_kennitala};
use kenni_auth::session::Role;
use kenni_auth::storage::{NewUser, UserRecord};

use crate::{PgPool, StorageError, StorageResult};

// =============================================================================
// Types
// =============================================================================

type UserTuple = (
    Uuid,
    String,
    String,
    String,
    Date,
    String,
    Option<String>,
    OffsetDateTime,
);

/// User row from the `users` table.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub personal_code: String,
    pub full_name: String,
    pub role: String,
    pub birth_date: Date,
    pub kennital_type: String,
    pub email: Option<String>,
    pub created_at: OffsetDateTime,
}

impl UserRow {
    fn from_tuple(row: UserTuple) -> Self {
        Self {
            id: row.0,
            personal_code: row.1,
            full_name: row.2,
            role: row.3,
            birth_date: row.4,
            kennital_type: row.5,
            email: row.6,
            created_at: row.7,
        }
    }

    /// Maps the row to the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidData`] if `role` or `kennital_type`
    /// holds an unknown value.
    pub fn into_record(self) -> StorageResult<UserRecord> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| StorageError::invalid_data(format!("unknown role '{}'", self.role)))?;
        let kennital_type = KennitalaKind::parse(&self.kennital_type).ok_or_else(|| {
            StorageError::invalid_data(format!("unknown kennital_type '{}'", self.kennital_type))
        })?;

        Ok(UserRecord {
            id: self.id.to_string(),
            personal_code: self.personal_code,
            full_name: self.full_name,
            role,
            birth_date: self.birth_date,
            kennital_type,
            email: self.email,
            created_at: self.created_at,
        })
    }
}

// =============================================================================
// User Storage
// =============================================================================

/// User storage operations.
pub struct UserStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStorage<'a> {
    /// Create a new user storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by kennitala.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_personal_code(&self, personal_code: &str) -> StorageResult<Option<UserRow>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, personal_code, full_name, role, birth_date, kennital_type, email, created_at
            FROM users
            WHERE personal_code = $1
            "#,
        )
        .bind(personal_code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(UserRow::from_tuple))
    }

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<UserRow>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, personal_code, full_name, role, birth_date, kennital_type, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(UserRow::from_tuple))
    }

    /// Insert a new user with the default role.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if the kennitala is already
    /// registered, or a database error.
    pub async fn create(&self, user: &NewUser) -> StorageResult<UserRow> {
        let row: UserTuple = query_as(
            r#"
            INSERT INTO users (id, personal_code, full_name, role, birth_date, kennital_type, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, personal_code, full_name, role, birth_date, kennital_type, email, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.personal_code)
        .bind(&user.full_name)
        .bind(Role::default().as_str())
        .bind(user.birth_date)
        .bind(user.kennital_type.as_str())
        .bind(&user.email)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict(format!(
                    "User with kennitala '{}' already exists",
                    mask_kennitala(&user.personal_code)
                ));
            }
            StorageError::from(e)
        })?;

        Ok(UserRow::from_tuple(row))
    }
}
