//! The Kenni login flow.
//!
//! ```text
//! start     -> state + PKCE + nonce -> redirect to Kenni
//! callback  -> decode state -> exchange code -> validate ID token
//!           -> parse kennitala -> resolve user -> audit -> session -> redirect
//! ```
//!
//! Nothing is stored server-side between the two legs; everything the
//! callback needs travels in the `state` parameter. Every failure ends in a
//! generic notice and a redirect to the login page. The detail is logged.

use std::sync::Arc;

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::config::{AuthConfig, RoutesConfig};
use crate::device::ClientInfo;
use crate::federation::{IdentityProvider, IdpError};
use crate::identity::{
    IdentityResolver, NationalIdError, ResolveError, mask_kennitala, parse_kennitala,
};
use crate::notice::{self, Notices};
use crate::oauth::{
    AuthorizationState, PkceChallenge, PkceError, PkceVerifier, StateError, random_token,
    sanitize_return_path,
};
use crate::session::{SessionError, SessionGateway};
use crate::storage::{LoginAuditRecord, LoginAuditStorage, UserRecord, UserStorage};

/// Query parameters Kenni sends to the callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// The `state` value produced at login start.
    pub state: Option<String>,
    /// OAuth error code, when the provider refused.
    pub error: Option<String>,
    /// Human-readable error detail.
    pub error_description: Option<String>,
}

/// Errors completing a login.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The callback lacked `code` or `state`.
    #[error("Callback is missing code or state")]
    MissingParameters,

    /// The provider redirected back with an error.
    #[error("Provider returned error '{error}': {description}")]
    ProviderError {
        /// OAuth error code.
        error: String,
        /// Error description, possibly empty.
        description: String,
    },

    /// The `state` value could not be decoded.
    #[error(transparent)]
    State(#[from] StateError),

    /// The PKCE verifier carried in `state` is invalid.
    #[error("Invalid PKCE verifier in state: {0}")]
    Pkce(#[from] PkceError),

    /// The authorization URL could not be built.
    #[error("Failed to build authorization URL: {0}")]
    Authorization(#[source] IdpError),

    /// The code exchange failed.
    #[error("Code exchange failed: {0}")]
    Exchange(#[source] IdpError),

    /// The ID token was rejected.
    #[error("ID token rejected: {0}")]
    Claims(#[source] IdpError),

    /// The asserted kennitala is invalid.
    #[error("Invalid national identifier: {0}")]
    NationalId(#[from] NationalIdError),

    /// The user could not be resolved.
    #[error("Failed to resolve user: {0}")]
    Resolve(#[from] ResolveError),

    /// The session could not be created.
    #[error("Failed to create session: {0}")]
    Session(#[from] SessionError),
}

impl FlowError {
    /// Short machine-readable code for logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameters => "missing_parameters",
            Self::ProviderError { .. } => "provider_error",
            Self::State(_) => "malformed_state",
            Self::Pkce(_) => "invalid_verifier",
            Self::Authorization(_) => "authorization_url",
            Self::Exchange(_) => "code_exchange",
            Self::Claims(_) => "id_token",
            Self::NationalId(_) => "national_id",
            Self::Resolve(_) => "resolve_user",
            Self::Session(_) => "session",
        }
    }

    fn notice(&self) -> &'static str {
        match self {
            Self::MissingParameters => notice::MSG_MISSING_PARAMETERS,
            Self::State(_) | Self::Pkce(_) => notice::MSG_MISSING_VERIFIER,
            Self::Authorization(_) => notice::MSG_AUTHORIZATION_URL_FAILED,
            _ => notice::MSG_LOGIN_FAILED,
        }
    }
}

/// A redirect with the cookies to set alongside it.
#[derive(Debug)]
pub struct FlowRedirect {
    /// Cookies to set or remove.
    pub jar: CookieJar,
    /// Redirect target.
    pub location: String,
}

impl IntoResponse for FlowRedirect {
    fn into_response(self) -> Response {
        (self.jar, Redirect::to(&self.location)).into_response()
    }
}

/// A successfully completed login.
#[derive(Debug)]
struct Completed {
    jar: CookieJar,
    user: UserRecord,
    return_path: String,
}

/// Drives the login flow against an [`IdentityProvider`].
#[derive(Clone)]
pub struct LoginFlow {
    provider: Arc<dyn IdentityProvider>,
    resolver: IdentityResolver,
    audit: Arc<dyn LoginAuditStorage>,
    sessions: SessionGateway,
    notices: Notices,
    login_path: String,
    default_return_path: String,
    verify_checksum: bool,
}

impl LoginFlow {
    /// Creates a flow with default routes.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStorage>,
        audit: Arc<dyn LoginAuditStorage>,
        sessions: SessionGateway,
        notices: Notices,
    ) -> Self {
        let routes = RoutesConfig::default();
        Self {
            provider,
            resolver: IdentityResolver::new(users),
            audit,
            sessions,
            notices,
            login_path: routes.login_path,
            default_return_path: routes.default_return_path,
            verify_checksum: false,
        }
    }

    /// Applies route and identity settings from configuration.
    #[must_use]
    pub fn with_config(mut self, config: &AuthConfig) -> Self {
        self.login_path = config.routes.login_path.clone();
        self.default_return_path = config.routes.default_return_path.clone();
        self.verify_checksum = config.identity.verify_checksum;
        self
    }

    /// Enables kennitala check digit verification.
    #[must_use]
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    /// The session gateway used to mint sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionGateway {
        &self.sessions
    }

    /// The notice writer.
    #[must_use]
    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// The login page path.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Starts a login, redirecting to Kenni.
    ///
    /// `next` is where the user lands afterwards; unsafe values become the
    /// default return path.
    pub async fn start(&self, jar: CookieJar, next: Option<&str>) -> FlowRedirect {
        let return_path = match next {
            Some(next) if !next.is_empty() => sanitize_return_path(next),
            _ => self.default_return_path.clone(),
        };

        match self.authorization_redirect(&return_path).await {
            Ok(location) => FlowRedirect { jar, location },
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "Failed to start Kenni login");
                self.fail(jar, &e)
            }
        }
    }

    /// Completes a login from the provider's callback.
    pub async fn callback(
        &self,
        jar: CookieJar,
        params: CallbackParams,
        client: &ClientInfo,
    ) -> FlowRedirect {
        match self.complete(jar.clone(), params, client).await {
            Ok(done) => {
                tracing::info!(
                    user_id = %done.user.id,
                    role = %done.user.role,
                    ip_address = %client.ip_address,
                    "Kenni login succeeded"
                );
                let jar = self.notices.notify(done.jar, notice::MSG_LOGIN_SUCCEEDED);
                FlowRedirect {
                    jar,
                    location: done.return_path,
                }
            }
            Err(e) => {
                match &e {
                    FlowError::MissingParameters
                    | FlowError::State(_)
                    | FlowError::Pkce(_)
                    | FlowError::ProviderError { .. } => {
                        tracing::warn!(error = %e, code = e.code(), "Kenni callback rejected");
                    }
                    _ => {
                        tracing::error!(error = %e, code = e.code(), "Kenni login failed");
                    }
                }
                self.fail(jar, &e)
            }
        }
    }

    /// Ends the session and redirects to the login page.
    pub fn logout(&self, jar: CookieJar) -> FlowRedirect {
        if let Ok(claims) = self.sessions.read(&jar) {
            tracing::info!(user_id = %claims.subject_id, "User logged out");
        }
        FlowRedirect {
            jar: self.sessions.destroy(jar),
            location: self.login_path.clone(),
        }
    }

    async fn authorization_redirect(&self, return_path: &str) -> Result<String, FlowError> {
        let nonce = random_token();
        let verifier = PkceVerifier::generate();
        let challenge = PkceChallenge::from_verifier(&verifier);
        let state = AuthorizationState::new(nonce.as_str(), return_path, verifier.into_inner());

        let url = self
            .provider
            .authorization_url(&state.encode(), &state.csrf_nonce, &challenge)
            .await
            .map_err(FlowError::Authorization)?;
        Ok(url.into())
    }

    async fn complete(
        &self,
        jar: CookieJar,
        params: CallbackParams,
        client: &ClientInfo,
    ) -> Result<Completed, FlowError> {
        if let Some(error) = params.error {
            return Err(FlowError::ProviderError {
                error,
                description: params.error_description.unwrap_or_default(),
            });
        }

        let (Some(code), Some(raw_state)) = (
            params.code.filter(|c| !c.is_empty()),
            params.state.filter(|s| !s.is_empty()),
        ) else {
            return Err(FlowError::MissingParameters);
        };

        let state = AuthorizationState::decode(&raw_state)?;
        let verifier = PkceVerifier::new(state.pkce_verifier.as_str())?;

        let tokens = self
            .provider
            .exchange_code(&code, &verifier)
            .await
            .map_err(FlowError::Exchange)?;

        let identity = self
            .provider
            .validate_id_token(&tokens.id_token, &state.csrf_nonce)
            .await
            .map_err(FlowError::Claims)?;

        let national = parse_kennitala(&identity.national_id, self.verify_checksum)?;

        let resolution = self
            .resolver
            .resolve_or_create(&national.kennitala, &identity.full_name, &national)
            .await?;
        let user = resolution.user;

        tracing::debug!(
            user_id = %user.id,
            personal_code = %mask_kennitala(&national.kennitala),
            action = ?resolution.action,
            "Resolved Kenni identity"
        );

        let record = LoginAuditRecord {
            user_id: user.id.clone(),
            external_subject: identity.subject,
            id_token: tokens.id_token,
            access_token: tokens.access_token,
            claims_snapshot: identity.raw_claims,
            source_ip: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        if let Err(e) = self.audit.insert(&record).await {
            tracing::error!(error = %e, user_id = %user.id, "Failed to record Kenni login");
        }

        let (jar, _claims) = self.sessions.create(jar, user.principal())?;

        Ok(Completed {
            jar,
            user,
            return_path: state.return_path,
        })
    }

    fn fail(&self, jar: CookieJar, error: &FlowError) -> FlowRedirect {
        FlowRedirect {
            jar: self.notices.notify(jar, error.notice()),
            location: self.login_path.clone(),
        }
    }
}

impl std::fmt::Debug for LoginFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("login_path", &self.login_path)
            .field("default_return_path", &self.default_return_path)
            .field("verify_checksum", &self.verify_checksum)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::federation::{ExternalIdentity, TokenSet};
    use crate::notice::NOTICE_COOKIE_PREFIX;
    use crate::session::{Role, SessionCodec};
    use crate::storage::{MemoryStorage, StorageError};

    const SECRET: &str = "test-secret-key-that-is-at-least-32-bytes";

    /// Provider that accepts one code and asserts a fixed identity.
    #[derive(Default)]
    struct ScriptedProvider {
        national_id: String,
        fail_exchange: bool,
        seen_verifier: Mutex<Option<String>>,
        seen_nonce: Mutex<Option<String>>,
    }

    impl ScriptedProvider {
        fn asserting(national_id: &str) -> Self {
            Self {
                national_id: national_id.to_string(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for ScriptedProvider {
        async fn authorization_url(
            &self,
            state: &str,
            nonce: &str,
            challenge: &PkceChallenge,
        ) -> Result<Url, IdpError> {
            let mut url = Url::parse("https://idp.kenni.is/acme/oidc/auth")?;
            url.query_pairs_mut()
                .append_pair("state", state)
                .append_pair("nonce", nonce)
                .append_pair("code_challenge", challenge.as_str());
            Ok(url)
        }

        async fn exchange_code(
            &self,
            code: &str,
            verifier: &PkceVerifier,
        ) -> Result<TokenSet, IdpError> {
            if self.fail_exchange || code != "good-code" {
                return Err(IdpError::oauth_error("invalid_grant", "bad code"));
            }
            *self.seen_verifier.lock().unwrap() = Some(verifier.as_str().to_string());
            Ok(TokenSet {
                id_token: "id.token.jwt".to_string(),
                access_token: "access-token".to_string(),
                token_type: Some("Bearer".to_string()),
                expires_in: Some(300),
                refresh_token: None,
                scope: None,
            })
        }

        async fn validate_id_token(
            &self,
            _id_token: &str,
            expected_nonce: &str,
        ) -> Result<ExternalIdentity, IdpError> {
            *self.seen_nonce.lock().unwrap() = Some(expected_nonce.to_string());
            Ok(ExternalIdentity {
                subject: "abc".to_string(),
                full_name: "Jón Jónsson".to_string(),
                national_id: self.national_id.clone(),
                raw_claims: serde_json::json!({
                    "sub": "abc",
                    "name": "Jón Jónsson",
                    "national_id": self.national_id,
                }),
            })
        }
    }

    struct FailingAudit;

    #[async_trait]
    impl LoginAuditStorage for FailingAudit {
        async fn insert(&self, _record: &LoginAuditRecord) -> Result<(), StorageError> {
            Err(StorageError::database("audit table missing"))
        }
    }

    fn flow_with(provider: Arc<ScriptedProvider>, store: Arc<MemoryStorage>) -> LoginFlow {
        let codec = SessionCodec::new(SECRET).unwrap();
        LoginFlow::new(
            provider,
            store.clone(),
            store,
            SessionGateway::new(codec, "acme-session", false),
            Notices::default(),
        )
    }

    fn state_from(location: &str) -> String {
        Url::parse(location)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn notices_in(jar: &CookieJar) -> Vec<String> {
        jar.iter()
            .filter(|c| c.name().starts_with(NOTICE_COOKIE_PREFIX))
            .map(|c| c.value().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_start_packs_state() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let flow = flow_with(provider, Arc::new(MemoryStorage::new()));

        let redirect = flow.start(CookieJar::new(), Some("/profile")).await;
        assert!(redirect.location.starts_with("https://idp.kenni.is/"));

        let state = AuthorizationState::decode(&state_from(&redirect.location)).unwrap();
        assert_eq!(state.return_path, "/profile");
        assert!(PkceVerifier::new(state.pkce_verifier.as_str()).is_ok());

        let url = Url::parse(&redirect.location).unwrap();
        let nonce = url.query_pairs().find(|(k, _)| k == "nonce").unwrap().1;
        assert_eq!(nonce, state.csrf_nonce);
    }

    #[tokio::test]
    async fn test_start_rejects_offsite_next() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let flow = flow_with(provider, Arc::new(MemoryStorage::new()));

        for next in [None, Some(""), Some("https://evil.example"), Some("//evil.example")] {
            let redirect = flow.start(CookieJar::new(), next).await;
            let state = AuthorizationState::decode(&state_from(&redirect.location)).unwrap();
            assert_eq!(state.return_path, "/", "{next:?}");
        }
    }

    #[tokio::test]
    async fn test_callback_logs_user_in() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let store = Arc::new(MemoryStorage::new());
        let flow = flow_with(provider.clone(), store.clone());

        let start = flow.start(CookieJar::new(), Some("/profile")).await;
        let raw_state = state_from(&start.location);
        let state = AuthorizationState::decode(&raw_state).unwrap();

        let client = ClientInfo {
            ip_address: "203.0.113.7".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
        };
        let params = CallbackParams {
            code: Some("good-code".to_string()),
            state: Some(raw_state),
            ..CallbackParams::default()
        };
        let redirect = flow.callback(CookieJar::new(), params, &client).await;

        assert_eq!(redirect.location, "/profile");
        assert_eq!(
            provider.seen_verifier.lock().unwrap().as_deref(),
            Some(state.pkce_verifier.as_str())
        );
        assert_eq!(
            provider.seen_nonce.lock().unwrap().as_deref(),
            Some(state.csrf_nonce.as_str())
        );

        let user = store.find_by_personal_code("0101307790").await.unwrap().unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.full_name, "Jón Jónsson");

        let claims = flow.sessions().read(&redirect.jar).unwrap();
        assert_eq!(claims.subject_id, user.id);
        assert_eq!(claims.role, Role::User);

        assert_eq!(notices_in(&redirect.jar), [notice::MSG_LOGIN_SUCCEEDED]);

        let audits = store.login_audits().await;
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].user_id, user.id);
        assert_eq!(audits[0].external_subject, "abc");
        assert_eq!(audits[0].id_token, "id.token.jwt");
        assert_eq!(audits[0].access_token, "access-token");
        assert_eq!(audits[0].source_ip, "203.0.113.7");
        assert_eq!(audits[0].claims_snapshot["national_id"], "0101307790");
    }

    #[tokio::test]
    async fn test_repeat_login_reuses_user() {
        let provider = Arc::new(ScriptedProvider::asserting("1201743399"));
        let store = Arc::new(MemoryStorage::new());
        let flow = flow_with(provider, store.clone());

        for _ in 0..2 {
            let start = flow.start(CookieJar::new(), None).await;
            let params = CallbackParams {
                code: Some("good-code".to_string()),
                state: Some(state_from(&start.location)),
                ..CallbackParams::default()
            };
            let redirect = flow
                .callback(CookieJar::new(), params, &ClientInfo::default())
                .await;
            assert_eq!(redirect.location, "/");
        }

        assert_eq!(store.user_count(), 1);
        assert_eq!(store.login_audits().await.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let flow = flow_with(provider, Arc::new(MemoryStorage::new()));

        let params = CallbackParams {
            code: Some("good-code".to_string()),
            ..CallbackParams::default()
        };
        let redirect = flow
            .callback(CookieJar::new(), params, &ClientInfo::default())
            .await;

        assert_eq!(redirect.location, "/login");
        assert_eq!(notices_in(&redirect.jar), [notice::MSG_MISSING_PARAMETERS]);
        assert!(redirect.jar.get("acme-session").is_none());
    }

    #[tokio::test]
    async fn test_malformed_state() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let flow = flow_with(provider, Arc::new(MemoryStorage::new()));

        for state in ["a:b", "nonce:%2F:short"] {
            let params = CallbackParams {
                code: Some("good-code".to_string()),
                state: Some(state.to_string()),
                ..CallbackParams::default()
            };
            let redirect = flow
                .callback(CookieJar::new(), params, &ClientInfo::default())
                .await;
            assert_eq!(redirect.location, "/login");
            assert_eq!(notices_in(&redirect.jar), [notice::MSG_MISSING_VERIFIER]);
        }
    }

    #[tokio::test]
    async fn test_provider_error_fails_login() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let store = Arc::new(MemoryStorage::new());
        let flow = flow_with(provider, store.clone());

        let params = CallbackParams {
            error: Some("access_denied".to_string()),
            error_description: Some("User cancelled".to_string()),
            ..CallbackParams::default()
        };
        let redirect = flow
            .callback(CookieJar::new(), params, &ClientInfo::default())
            .await;

        assert_eq!(redirect.location, "/login");
        assert_eq!(notices_in(&redirect.jar), [notice::MSG_LOGIN_FAILED]);
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_exchange_failure_creates_nothing() {
        let provider = Arc::new(ScriptedProvider {
            national_id: "0101307790".to_string(),
            fail_exchange: true,
            ..ScriptedProvider::default()
        });
        let store = Arc::new(MemoryStorage::new());
        let flow = flow_with(provider, store.clone());

        let start = flow.start(CookieJar::new(), Some("/profile")).await;
        let params = CallbackParams {
            code: Some("good-code".to_string()),
            state: Some(state_from(&start.location)),
            ..CallbackParams::default()
        };
        let redirect = flow
            .callback(CookieJar::new(), params, &ClientInfo::default())
            .await;

        assert_eq!(redirect.location, "/login");
        assert_eq!(notices_in(&redirect.jar), [notice::MSG_LOGIN_FAILED]);
        assert!(redirect.jar.get("acme-session").is_none());
        assert_eq!(store.user_count(), 0);
        assert!(store.login_audits().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_kennitala_fails_login() {
        let provider = Arc::new(ScriptedProvider::asserting("3213743399"));
        let store = Arc::new(MemoryStorage::new());
        let flow = flow_with(provider, store.clone());

        let start = flow.start(CookieJar::new(), None).await;
        let params = CallbackParams {
            code: Some("good-code".to_string()),
            state: Some(state_from(&start.location)),
            ..CallbackParams::default()
        };
        let redirect = flow
            .callback(CookieJar::new(), params, &ClientInfo::default())
            .await;

        assert_eq!(redirect.location, "/login");
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_checksum_verification_applies() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let store = Arc::new(MemoryStorage::new());
        let flow = flow_with(provider, store.clone()).with_checksum_verification(true);

        let start = flow.start(CookieJar::new(), None).await;
        let params = CallbackParams {
            code: Some("good-code".to_string()),
            state: Some(state_from(&start.location)),
            ..CallbackParams::default()
        };
        let redirect = flow
            .callback(CookieJar::new(), params, &ClientInfo::default())
            .await;

        assert_eq!(redirect.location, "/login");
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_block_login() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let store = Arc::new(MemoryStorage::new());
        let flow = LoginFlow::new(
            provider,
            store.clone(),
            Arc::new(FailingAudit),
            SessionGateway::new(SessionCodec::new(SECRET).unwrap(), "acme-session", false),
            Notices::default(),
        );

        let start = flow.start(CookieJar::new(), Some("/dashboard")).await;
        let params = CallbackParams {
            code: Some("good-code".to_string()),
            state: Some(state_from(&start.location)),
            ..CallbackParams::default()
        };
        let redirect = flow
            .callback(CookieJar::new(), params, &ClientInfo::default())
            .await;

        assert_eq!(redirect.location, "/dashboard");
        assert!(flow.sessions().read(&redirect.jar).is_ok());
    }

    #[tokio::test]
    async fn test_logout_removes_session() {
        let provider = Arc::new(ScriptedProvider::asserting("0101307790"));
        let flow = flow_with(provider, Arc::new(MemoryStorage::new()));

        let principal = crate::session::SessionPrincipal::new("u1", "Jón", Role::User);
        let (jar, _) = flow.sessions().create(CookieJar::new(), principal).unwrap();

        let redirect = flow.logout(jar);
        assert_eq!(redirect.location, "/login");
        assert!(flow.sessions().read(&redirect.jar).unwrap_err().is_missing());
    }
}
