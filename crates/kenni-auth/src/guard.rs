//! Access guards for protected pages.
//!
//! Guards never fail with an error page. A missing, invalid or
//! insufficiently privileged session redirects to the login page with the
//! requested path as `next`, so the user lands back where they started.

use std::sync::Arc;

use axum::response::{IntoResponse, Redirect, Response};

use crate::session::{Role, SessionClaims, SessionLookup};
use crate::storage::{UserRecord, UserStorage};

/// A redirect to the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRedirect {
    location: String,
}

impl GuardRedirect {
    /// Redirect target.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for GuardRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location).into_response()
    }
}

/// Builds `login_path?next=<current_path>`, or just `login_path`.
#[must_use]
pub fn login_redirect_url(login_path: &str, current_path: Option<&str>) -> String {
    match current_path {
        Some(path) if !path.is_empty() => {
            format!("{login_path}?next={}", urlencoding::encode(path))
        }
        _ => login_path.to_string(),
    }
}

/// Decides whether a request may proceed.
#[derive(Clone)]
pub struct AccessGuard {
    users: Arc<dyn UserStorage>,
    login_path: String,
}

impl AccessGuard {
    /// Creates a guard redirecting to `login_path`.
    pub fn new(users: Arc<dyn UserStorage>, login_path: impl Into<String>) -> Self {
        Self {
            users,
            login_path: login_path.into(),
        }
    }

    /// The login page path.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Requires a valid session.
    ///
    /// # Errors
    ///
    /// Returns a [`GuardRedirect`] to the login page when there is no valid
    /// session.
    pub fn require_session(
        &self,
        lookup: &SessionLookup,
        current_path: Option<&str>,
    ) -> Result<SessionClaims, GuardRedirect> {
        let claims = match lookup.result() {
            Ok(claims) => claims,
            Err(e) => {
                if e.is_rejection() {
                    tracing::warn!(code = e.code(), path = ?current_path, "Rejected session token");
                }
                return Err(self.redirect(current_path));
            }
        };

        if let Err(e) = claims.validate() {
            tracing::error!(
                user_id = %claims.subject_id,
                code = e.code(),
                path = ?current_path,
                "Session validation failed"
            );
            return Err(self.redirect(current_path));
        }

        Ok(claims.clone())
    }

    /// Requires a valid session carrying `role`.
    ///
    /// # Errors
    ///
    /// Returns a [`GuardRedirect`] to the login page when there is no valid
    /// session or the role differs.
    pub fn require_role(
        &self,
        lookup: &SessionLookup,
        role: Role,
        current_path: Option<&str>,
    ) -> Result<SessionClaims, GuardRedirect> {
        let claims = self.require_session(lookup, current_path)?;
        if !claims.has_role(role) {
            tracing::info!(
                user_id = %claims.subject_id,
                role = %claims.role,
                required = %role,
                "Insufficient role"
            );
            return Err(self.redirect(current_path));
        }
        Ok(claims)
    }

    /// Requires a valid session whose user still exists.
    ///
    /// # Errors
    ///
    /// Returns a [`GuardRedirect`] to the login page when there is no valid
    /// session or the user cannot be loaded.
    pub async fn require_user(
        &self,
        lookup: &SessionLookup,
        current_path: Option<&str>,
    ) -> Result<(SessionClaims, UserRecord), GuardRedirect> {
        let claims = self.require_session(lookup, current_path)?;
        let user = self.load_user(&claims, current_path).await?;
        Ok((claims, user))
    }

    /// Requires an admin session whose user still exists.
    ///
    /// The role is read from the session token, not the loaded record, so a
    /// demotion takes effect once the current session expires.
    ///
    /// # Errors
    ///
    /// Returns a [`GuardRedirect`] to the login page when there is no valid
    /// admin session or the user cannot be loaded.
    pub async fn require_admin_user(
        &self,
        lookup: &SessionLookup,
        current_path: Option<&str>,
    ) -> Result<(SessionClaims, UserRecord), GuardRedirect> {
        let claims = self.require_role(lookup, Role::Admin, current_path)?;
        let user = self.load_user(&claims, current_path).await?;
        Ok((claims, user))
    }

    async fn load_user(
        &self,
        claims: &SessionClaims,
        current_path: Option<&str>,
    ) -> Result<UserRecord, GuardRedirect> {
        match self.users.find_by_id(&claims.subject_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                tracing::warn!(user_id = %claims.subject_id, "Session user no longer exists");
                Err(self.redirect(current_path))
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %claims.subject_id, "Failed to load session user");
                Err(self.redirect(current_path))
            }
        }
    }

    fn redirect(&self, current_path: Option<&str>) -> GuardRedirect {
        GuardRedirect {
            location: login_redirect_url(&self.login_path, current_path),
        }
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::identity::KennitalaKind;
    use crate::session::{SessionError, SessionPrincipal};
    use crate::storage::{MemoryStorage, NewUser};

    fn guard(store: Arc<MemoryStorage>) -> AccessGuard {
        AccessGuard::new(store, "/login")
    }

    fn lookup_for(subject: &str, role: Role) -> SessionLookup {
        let principal = SessionPrincipal::new(subject, "Jón Jónsson", role);
        SessionLookup::from(Ok::<_, SessionError>(SessionClaims::issue(
            principal,
            1_700_000_000,
            3600,
        )))
    }

    async fn stored_user(store: &MemoryStorage) -> UserRecord {
        UserStorage::insert(
            store,
            &NewUser {
                personal_code: "1201743399".to_string(),
                full_name: "Jón Jónsson".to_string(),
                birth_date: date!(1974 - 01 - 12),
                kennital_type: KennitalaKind::Individual,
                email: None,
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_login_redirect_url() {
        assert_eq!(
            login_redirect_url("/login", Some("/admin/reports")),
            "/login?next=%2Fadmin%2Freports"
        );
        assert_eq!(login_redirect_url("/login", Some("")), "/login");
        assert_eq!(login_redirect_url("/login", None), "/login");
    }

    #[test]
    fn test_no_session_redirects_with_next() {
        let guard = guard(Arc::new(MemoryStorage::new()));
        let err = guard
            .require_session(&SessionLookup::anonymous(), Some("/admin/reports"))
            .unwrap_err();
        assert_eq!(err.location(), "/login?next=%2Fadmin%2Freports");
    }

    #[test]
    fn test_rejected_token_redirects() {
        let guard = guard(Arc::new(MemoryStorage::new()));
        let lookup = SessionLookup::from(Err::<SessionClaims, _>(SessionError::ExpiredToken));
        let err = guard.require_session(&lookup, None).unwrap_err();
        assert_eq!(err.location(), "/login");
    }

    #[test]
    fn test_valid_session_passes() {
        let guard = guard(Arc::new(MemoryStorage::new()));
        let claims = guard
            .require_session(&lookup_for("u1", Role::User), Some("/dashboard"))
            .unwrap();
        assert_eq!(claims.subject_id, "u1");
    }

    #[test]
    fn test_structurally_invalid_claims_redirect() {
        let guard = guard(Arc::new(MemoryStorage::new()));
        let claims = SessionClaims {
            subject_id: " ".to_string(),
            display_name: "Jón".to_string(),
            role: Role::User,
            issued_at: 10,
            expires_at: 20,
        };
        let err = guard
            .require_session(&SessionLookup::from(Ok::<_, SessionError>(claims)), Some("/profile"))
            .unwrap_err();
        assert_eq!(err.location(), "/login?next=%2Fprofile");
    }

    #[test]
    fn test_role_mismatch_redirects_to_login() {
        let guard = guard(Arc::new(MemoryStorage::new()));
        let err = guard
            .require_role(&lookup_for("u1", Role::User), Role::Admin, Some("/admin"))
            .unwrap_err();
        assert_eq!(err.location(), "/login?next=%2Fadmin");

        assert!(
            guard
                .require_role(&lookup_for("u1", Role::Admin), Role::Admin, Some("/admin"))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_require_user_loads_record() {
        let store = Arc::new(MemoryStorage::new());
        let user = stored_user(&store).await;
        let guard = guard(store);

        let (claims, loaded) = guard
            .require_user(&lookup_for(&user.id, Role::User), Some("/profile"))
            .await
            .unwrap();
        assert_eq!(claims.subject_id, user.id);
        assert_eq!(loaded, user);
    }

    #[tokio::test]
    async fn test_require_user_missing_row_redirects() {
        let guard = guard(Arc::new(MemoryStorage::new()));
        let err = guard
            .require_user(&lookup_for("deleted-user", Role::User), Some("/profile"))
            .await
            .unwrap_err();
        assert_eq!(err.location(), "/login?next=%2Fprofile");
    }

    #[tokio::test]
    async fn test_require_admin_user() {
        let store = Arc::new(MemoryStorage::new());
        let user = stored_user(&store).await;
        let guard = guard(store);

        assert!(
            guard
                .require_admin_user(&lookup_for(&user.id, Role::User), Some("/admin"))
                .await
                .is_err()
        );
        let (_, loaded) = guard
            .require_admin_user(&lookup_for(&user.id, Role::Admin), Some("/admin"))
            .await
            .unwrap();
        assert_eq!(loaded.id, user.id);
        // The stored role is still `user`; the token's role decides.
        assert_eq!(loaded.role, Role::User);
    }
}
