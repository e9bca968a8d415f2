//! Session cookie storage.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::claims::{SessionClaims, SessionPrincipal};
use super::codec::SessionCodec;
use super::error::SessionError;

/// Reads and writes the session token in the session cookie.
#[derive(Debug, Clone)]
pub struct SessionGateway {
    codec: SessionCodec,
    cookie_name: String,
    secure: bool,
}

impl SessionGateway {
    /// Creates a gateway storing tokens from `codec` under `cookie_name`.
    #[must_use]
    pub fn new(codec: SessionCodec, cookie_name: impl Into<String>, secure: bool) -> Self {
        Self {
            codec,
            cookie_name: cookie_name.into(),
            secure,
        }
    }

    /// Returns the underlying codec.
    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// Returns the session cookie name.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Signs a new session for `principal` and stores it in the jar.
    ///
    /// Any previous session cookie is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encoding`] if the token cannot be signed.
    pub fn create(
        &self,
        jar: CookieJar,
        principal: SessionPrincipal,
    ) -> Result<(CookieJar, SessionClaims), SessionError> {
        let signed = self.codec.sign(principal)?;
        let cookie = self.session_cookie(signed.token);
        Ok((jar.add(cookie), signed.claims))
    }

    /// Reads and verifies the session from the jar.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoSession`] if the cookie is absent or empty,
    /// otherwise whatever [`SessionCodec::verify`] reports.
    pub fn read(&self, jar: &CookieJar) -> Result<SessionClaims, SessionError> {
        let token = jar
            .get(&self.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(SessionError::NoSession)?;
        self.codec.verify(&token)
    }

    /// Removes the session cookie.
    #[must_use]
    pub fn destroy(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build((self.cookie_name.clone(), "")).path("/"))
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(self.codec.ttl_secs()))
            .build()
    }
}
