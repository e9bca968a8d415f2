//! Login, callback, logout and current-user handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use super::extractors::MaybeSession;
use super::state::AuthState;
use crate::device::ClientInfo;
use crate::error::AuthError;
use crate::flow::{CallbackParams, FlowRedirect};
use crate::session::Role;

/// Query parameters for login start.
#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    /// Where to go after login.
    pub next: Option<String>,
}

/// The signed-in user, as returned by `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    /// Local user ID.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: Role,
}

/// `GET /api/auth/login?next=`
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    params: Result<Query<LoginParams>, QueryRejection>,
) -> FlowRedirect {
    // An unreadable query (e.g. a repeated `next`) falls back to the default path.
    let next = params.ok().and_then(|Query(p)| p.next);
    state.flow().start(jar, next.as_deref()).await
}

/// `GET /api/auth/callback?code=&state=`
pub async fn callback(
    State(state): State<AuthState>,
    jar: CookieJar,
    headers: HeaderMap,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> FlowRedirect {
    let client = ClientInfo::from_headers(&headers);
    let params = match params {
        Ok(Query(params)) => params,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable callback query");
            CallbackParams::default()
        }
    };
    state.flow().callback(jar, params, &client).await
}

/// `GET|POST /api/auth/logout`
pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> FlowRedirect {
    state.flow().logout(jar)
}

/// `GET /api/auth/me`
pub async fn me(MaybeSession(session): MaybeSession) -> Result<Json<MeResponse>, AuthError> {
    let session = session.ok_or_else(|| AuthError::unauthorized("user_not_found"))?;
    Ok(Json(MeResponse {
        user_id: session.subject_id,
        name: session.display_name,
        role: session.role,
    }))
}
