//! Maps a verified Kenni identity to a local user, provisioning on first login.

use std::sync::Arc;

use super::kennitala::{NationalIdentity, mask_kennitala};
use crate::storage::{NewUser, StorageError, UserRecord, UserStorage};

/// How a user was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionAction {
    /// The user already existed.
    Existing,
    /// This call created the user.
    Created,
    /// Another request created the user between our lookup and insert.
    CreatedConcurrently,
}

/// The result of resolving an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The local user.
    pub user: UserRecord,
    /// How it was obtained.
    pub action: ResolutionAction,
}

/// Errors resolving an identity to a user.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The insert conflicted but the winning row could not be read back.
    #[error("User vanished after a conflicting insert")]
    Vanished,
}

/// Find-or-create for users keyed by kennitala.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserStorage>,
}

impl IdentityResolver {
    /// Creates a resolver over the given user store.
    pub fn new(users: Arc<dyn UserStorage>) -> Self {
        Self { users }
    }

    /// Returns the user with `personal_code`, creating one from `full_name`
    /// and `identity` if none exists.
    ///
    /// The name is only written on creation; later logins do not update it.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the store fails.
    pub async fn resolve_or_create(
        &self,
        personal_code: &str,
        full_name: &str,
        identity: &NationalIdentity,
    ) -> Result<Resolution, ResolveError> {
        let code = personal_code;

        if let Some(user) = self.users.find_by_personal_code(code).await? {
            return Ok(Resolution {
                user,
                action: ResolutionAction::Existing,
            });
        }

        let new_user = NewUser {
            personal_code: code.to_string(),
            full_name: full_name.to_string(),
            birth_date: identity.birth_date,
            kennital_type: identity.kind,
            email: None,
        };

        match self.users.insert(&new_user).await {
            Ok(user) => {
                tracing::info!(
                    user_id = %user.id,
                    personal_code = %mask_kennitala(code),
                    kind = %identity.kind,
                    "Provisioned new user"
                );
                Ok(Resolution {
                    user,
                    action: ResolutionAction::Created,
                })
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(
                    personal_code = %mask_kennitala(code),
                    "Concurrent first login, reading back existing user"
                );
                let user = self
                    .users
                    .find_by_personal_code(code)
                    .await?
                    .ok_or(ResolveError::Vanished)?;
                Ok(Resolution {
                    user,
                    action: ResolutionAction::CreatedConcurrently,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}
