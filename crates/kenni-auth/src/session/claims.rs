//! Session claims carried inside the signed session token.

use serde::{Deserialize, Serialize};

use super::error::SessionError;

/// Role of a signed-in user.
///
/// New users always start as [`Role::User`]; promotion to admin happens
/// out of band, directly in the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user.
    #[default]
    User,
    /// Administrator.
    Admin,
}

impl Role {
    /// Get the role as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a role from its stored string form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity a session is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPrincipal {
    /// Local user ID.
    pub subject_id: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Role at the time of login.
    pub role: Role,
}

impl SessionPrincipal {
    /// Creates a new principal.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

/// Verified claims of a session.
///
/// Claims are never mutated; a new login replaces the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Local user ID (also the token `sub`).
    pub subject_id: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Role at the time of login.
    pub role: Role,
    /// Issued-at, Unix seconds.
    pub issued_at: i64,
    /// Expiry, Unix seconds.
    pub expires_at: i64,
}

impl SessionClaims {
    /// Builds claims for `principal` issued at `now` with the given lifetime.
    #[must_use]
    pub fn issue(principal: SessionPrincipal, now: i64, ttl_secs: i64) -> Self {
        Self {
            subject_id: principal.subject_id,
            display_name: principal.display_name,
            role: principal.role,
            issued_at: now,
            expires_at: now.saturating_add(ttl_secs),
        }
    }

    /// Returns the principal these claims were issued for.
    #[must_use]
    pub fn principal(&self) -> SessionPrincipal {
        SessionPrincipal::new(&self.subject_id, &self.display_name, self.role)
    }

    /// Returns `true` if the session carries the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Re-checks the structural invariants of verified claims.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MalformedPayload`] if the subject is empty or
    /// the validity window is inverted.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.subject_id.trim().is_empty() {
            return Err(SessionError::MalformedPayload);
        }
        if self.expires_at <= self.issued_at {
            return Err(SessionError::MalformedPayload);
        }
        Ok(())
    }
}

/// On-the-wire shape of the token payload.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClaimsPayload {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<&SessionClaims> for ClaimsPayload {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.subject_id.clone(),
            name: claims.display_name.clone(),
            role: claims.role,
            sub: claims.subject_id.clone(),
            iat: claims.issued_at,
            exp: claims.expires_at,
        }
    }
}

impl TryFrom<ClaimsPayload> for SessionClaims {
    type Error = SessionError;

    fn try_from(payload: ClaimsPayload) -> Result<Self, Self::Error> {
        if payload.sub != payload.user_id {
            return Err(SessionError::MalformedPayload);
        }
        Ok(Self {
            subject_id: payload.user_id,
            display_name: payload.name,
            role: payload.role,
            issued_at: payload.iat,
            expires_at: payload.exp,
        })
    }
}
