//! Shared state for the authentication routes.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::federation::IdentityProvider;
use crate::flow::LoginFlow;
use crate::guard::AccessGuard;
use crate::notice::Notices;
use crate::session::{SessionCodec, SessionGateway};
use crate::storage::{LoginAuditStorage, UserStorage};

/// Everything the authentication handlers, extractors and middleware need.
///
/// Include it in your application state and expose it with
/// [`FromRef`](axum::extract::FromRef) to use the extractors in your own
/// handlers.
#[derive(Debug, Clone)]
pub struct AuthState {
    flow: LoginFlow,
    guard: AccessGuard,
}

impl AuthState {
    /// Creates state from a login flow; the guard shares its login path.
    pub fn new(flow: LoginFlow, users: Arc<dyn UserStorage>) -> Self {
        let guard = AccessGuard::new(users, flow.login_path());
        Self { flow, guard }
    }

    /// Builds state from configuration.
    ///
    /// `secure` sets the `Secure` attribute on session and notice cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the session
    /// secret is unusable.
    pub fn from_config(
        config: &AuthConfig,
        secure: bool,
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStorage>,
        audit: Arc<dyn LoginAuditStorage>,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        let codec = SessionCodec::new(&config.session_secret)?
            .with_ttl(config.session.ttl)
            .with_clock_skew(config.session.clock_skew);
        let sessions = SessionGateway::new(codec, config.session.cookie_name.clone(), secure);
        let notices = Notices::new(config.notices.max_age, secure);

        let flow = LoginFlow::new(provider, users.clone(), audit, sessions, notices)
            .with_config(config);
        Ok(Self::new(flow, users))
    }

    /// The login flow.
    #[must_use]
    pub fn flow(&self) -> &LoginFlow {
        &self.flow
    }

    /// The access guard.
    #[must_use]
    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// The session gateway.
    #[must_use]
    pub fn sessions(&self) -> &SessionGateway {
        self.flow.sessions()
    }

    /// The notice writer.
    #[must_use]
    pub fn notices(&self) -> &Notices {
        self.flow.notices()
    }
}
