//! # kenni-auth
//!
//! Kenni (Icelandic electronic ID) login and stateless sessions.
//!
//! This crate provides:
//! - The OIDC authorization code flow against Kenni, with PKCE and nonce
//! - Find-or-create of local users keyed by kennitala
//! - HMAC-signed session tokens in an HTTP-only cookie
//! - Access guards and axum extractors that redirect to the login page
//!
//! ## Modules
//!
//! - [`config`] - Authentication configuration
//! - [`session`] - Session tokens, cookie storage and per-request lookup
//! - [`oauth`] - PKCE and the `state` round-trip value
//! - [`federation`] - Kenni discovery, JWKS, code exchange and ID tokens
//! - [`identity`] - Kennitala parsing and user resolution
//! - [`flow`] - The login flow coordinator
//! - [`guard`] - Access guards
//! - [`notice`] - One-shot notice cookies
//! - [`storage`] - Storage traits and the in-memory backend
//! - [`http`] - Axum routes, extractors and middleware

pub mod config;
pub mod device;
pub mod error;
pub mod federation;
pub mod flow;
pub mod guard;
pub mod http;
pub mod identity;
pub mod notice;
pub mod oauth;
pub mod session;
pub mod storage;

pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use federation::{ExternalIdentity, IdentityProvider, IdpError, OidcClient, TokenSet};
pub use flow::{CallbackParams, FlowError, FlowRedirect, LoginFlow};
pub use guard::{AccessGuard, GuardRedirect};
pub use http::{
    AdminOnly, AuthState, Authenticated, CurrentAdmin, CurrentUser, MaybeSession, auth_routes,
    session_layer,
};
pub use identity::{IdentityResolver, KennitalaKind, NationalIdentity, parse_kennitala};
pub use notice::Notices;
pub use session::{Role, SessionClaims, SessionCodec, SessionError, SessionGateway};
pub use storage::{
    LoginAuditRecord, LoginAuditStorage, MemoryStorage, NewUser, StorageError, UserRecord,
    UserStorage,
};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use kenni_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::AuthError;
    pub use crate::http::{
        AdminOnly, AuthState, Authenticated, CurrentAdmin, CurrentUser, MaybeSession,
        auth_routes, session_layer,
    };
    pub use crate::session::{Role, SessionClaims};
    pub use crate::storage::{LoginAuditStorage, UserRecord, UserStorage};
}
