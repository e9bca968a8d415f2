//! The per-request session lookup.

use axum_extra::extract::cookie::CookieJar;

use super::claims::SessionClaims;
use super::error::SessionError;
use super::gateway::SessionGateway;

/// The outcome of reading the session cookie once for a request.
///
/// Computed at request entry and stored in the request extensions, so every
/// guard and handler in the same request sees the same verdict without
/// verifying the token again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLookup {
    result: Result<SessionClaims, SessionError>,
}

impl SessionLookup {
    /// Reads and verifies the session in `jar`.
    #[must_use]
    pub fn resolve(gateway: &SessionGateway, jar: &CookieJar) -> Self {
        Self {
            result: gateway.read(jar),
        }
    }

    /// A lookup for a request without a session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            result: Err(SessionError::NoSession),
        }
    }

    /// The verified claims or the reason there are none.
    pub fn result(&self) -> Result<&SessionClaims, &SessionError> {
        self.result.as_ref()
    }

    /// The verified claims, if any.
    #[must_use]
    pub fn claims(&self) -> Option<&SessionClaims> {
        self.result.as_ref().ok()
    }
}

impl From<Result<SessionClaims, SessionError>> for SessionLookup {
    fn from(result: Result<SessionClaims, SessionError>) -> Self {
        Self { result }
    }
}
