//! Axum extractors that apply the access guard.
//!
//! Each extractor reads the [`SessionLookup`] left by
//! [`session_layer`](super::middleware::session_layer). Without the layer the
//! cookie is verified on the spot.
//!
//! ```ignore
//! async fn dashboard(Authenticated(session): Authenticated) -> String {
//!     format!("Halló, {}", session.display_name)
//! }
//!
//! async fn reports(AdminOnly(session): AdminOnly) -> String { ... }
//! ```

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;

use super::state::AuthState;
use crate::guard::GuardRedirect;
use crate::session::{Role, SessionClaims, SessionLookup};
use crate::storage::UserRecord;

fn session_lookup(parts: &Parts, state: &AuthState) -> SessionLookup {
    if let Some(lookup) = parts.extensions.get::<SessionLookup>() {
        return lookup.clone();
    }
    let jar = CookieJar::from_headers(&parts.headers);
    SessionLookup::resolve(state.sessions(), &jar)
}

fn current_path(parts: &Parts) -> Option<&str> {
    parts.uri.path_and_query().map(|pq| pq.as_str())
}

/// A request with a valid session.
#[derive(Debug, Clone)]
pub struct Authenticated(pub SessionClaims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = GuardRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let lookup = session_lookup(parts, &auth);
        auth.guard()
            .require_session(&lookup, current_path(parts))
            .map(Self)
    }
}

/// A request with a valid admin session.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub SessionClaims);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = GuardRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let lookup = session_lookup(parts, &auth);
        auth.guard()
            .require_role(&lookup, Role::Admin, current_path(parts))
            .map(Self)
    }
}

/// A request with a valid session whose user still exists.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The session.
    pub session: SessionClaims,
    /// The stored user.
    pub user: UserRecord,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = GuardRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let lookup = session_lookup(parts, &auth);
        let (session, user) = auth.guard().require_user(&lookup, current_path(parts)).await?;
        Ok(Self { session, user })
    }
}

/// An admin request whose user still exists.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    /// The session.
    pub session: SessionClaims,
    /// The stored user.
    pub user: UserRecord,
}

impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = GuardRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let lookup = session_lookup(parts, &auth);
        let (session, user) = auth
            .guard()
            .require_admin_user(&lookup, current_path(parts))
            .await?;
        Ok(Self { session, user })
    }
}

/// The session, if any. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionClaims>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        Ok(Self(session_lookup(parts, &auth).claims().cloned()))
    }
}
