//! User storage trait.
//!
//! Users are keyed by an opaque id and are unique by kennitala
//! (`personal_code`). Backends must enforce that uniqueness atomically and
//! report a second insert of the same code as [`StorageError::Conflict`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::StorageError;
use crate::identity::KennitalaKind;
use crate::session::{Role, SessionPrincipal};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque user id (UUID).
    pub id: String,

    /// The user's kennitala.
    pub personal_code: String,

    /// Full name as asserted by Kenni at first login.
    pub full_name: String,

    /// Application role.
    pub role: Role,

    /// Date of birth derived from the kennitala.
    pub birth_date: Date,

    /// Person or company.
    pub kennital_type: KennitalaKind,

    /// Optional contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// When the user was first seen.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    /// The principal a session for this user carries.
    #[must_use]
    pub fn principal(&self) -> SessionPrincipal {
        SessionPrincipal::new(self.id.clone(), self.full_name.clone(), self.role)
    }
}

/// Fields supplied when a user is first provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// The user's kennitala.
    pub personal_code: String,
    /// Full name.
    pub full_name: String,
    /// Date of birth.
    pub birth_date: Date,
    /// Person or company.
    pub kennital_type: KennitalaKind,
    /// Optional contact address.
    pub email: Option<String>,
}

impl NewUser {
    /// Builds the record a backend stores, with a fresh id and
    /// the default role.
    #[must_use]
    pub fn into_record(self, created_at: OffsetDateTime) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4().to_string(),
            personal_code: self.personal_code,
            full_name: self.full_name,
            role: Role::default(),
            birth_date: self.birth_date,
            kennital_type: self.kennital_type,
            email: self.email,
            created_at,
        }
    }
}

/// Storage operations for users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find a user by kennitala.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_personal_code(
        &self,
        personal_code: &str,
    ) -> Result<Option<UserRecord>, StorageError>;

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if a user with the same
    /// `personal_code` already exists.
    async fn insert(&self, user: &NewUser) -> Result<UserRecord, StorageError>;
}
