//! One-shot user-facing notices carried in cookies.
//!
//! Each notice is its own `toast-<uuid>` cookie holding the message text.
//! Reading notices removes them.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

/// Cookie name prefix for notices.
pub const NOTICE_COOKIE_PREFIX: &str = "toast-";

/// Shown when the callback lacks `code` or `state`.
pub const MSG_MISSING_PARAMETERS: &str = "Ógild heimildarkall - vantar kóða eða stöðu";
/// Shown when the state has no PKCE verifier.
pub const MSG_MISSING_VERIFIER: &str = "Vantar öryggiskóða fyrir auðkenningu";
/// Shown when the authorization URL cannot be built.
pub const MSG_AUTHORIZATION_URL_FAILED: &str = "Ekki tókst að búa til auðkennisslóð";
/// Shown for every other login failure.
pub const MSG_LOGIN_FAILED: &str = "Innskráning mistókst. Vinsamlegast reynið aftur.";
/// Shown after a successful login.
pub const MSG_LOGIN_SUCCEEDED: &str = "Þú ert innskráður með Kenni rafrænum skilríkjum";

/// A notice read back from the jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Cookie name, usable with [`Notices::dismiss`].
    pub id: String,
    /// Message text.
    pub message: String,
}

/// Writes and reads notice cookies.
#[derive(Debug, Clone)]
pub struct Notices {
    max_age: Duration,
    secure: bool,
}

impl Notices {
    /// Creates a notice writer.
    #[must_use]
    pub fn new(max_age: Duration, secure: bool) -> Self {
        Self { max_age, secure }
    }

    /// Adds a notice to the jar.
    #[must_use]
    pub fn notify(&self, jar: CookieJar, message: impl Into<String>) -> CookieJar {
        let name = format!("{NOTICE_COOKIE_PREFIX}{}", Uuid::new_v4());
        let max_age = time::Duration::try_from(self.max_age).unwrap_or(time::Duration::minutes(5));
        let cookie = Cookie::build((name, message.into()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age);
        jar.add(cookie)
    }

    /// Returns all pending notices and removes them from the jar.
    #[must_use]
    pub fn take(&self, jar: CookieJar) -> (CookieJar, Vec<Notice>) {
        let mut notices: Vec<Notice> = jar
            .iter()
            .filter(|c| c.name().starts_with(NOTICE_COOKIE_PREFIX))
            .map(|c| Notice {
                id: c.name().to_string(),
                message: c.value().to_string(),
            })
            .collect();
        notices.sort_by(|a, b| a.id.cmp(&b.id));

        let jar = notices
            .iter()
            .fold(jar, |jar, notice| self.dismiss(jar, &notice.id));
        (jar, notices)
    }

    /// Removes a single notice.
    #[must_use]
    pub fn dismiss(&self, jar: CookieJar, id: &str) -> CookieJar {
        if !id.starts_with(NOTICE_COOKIE_PREFIX) {
            return jar;
        }
        jar.remove(Cookie::build((id.to_string(), "")).path("/"))
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60), false)
    }
}
