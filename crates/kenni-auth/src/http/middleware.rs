//! Per-request session lookup.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use super::state::AuthState;
use crate::session::SessionLookup;

/// Verifies the session cookie once and stores the [`SessionLookup`] in the
/// request extensions.
///
/// ```ignore
/// let app = Router::new()
///     .merge(pages)
///     .layer(axum::middleware::from_fn_with_state(auth.clone(), session_layer));
/// ```
pub async fn session_layer(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let lookup = SessionLookup::resolve(state.sessions(), &jar);
    if let Err(e) = lookup.result()
        && e.is_rejection()
    {
        tracing::debug!(code = e.code(), path = %request.uri().path(), "Session cookie rejected");
    }
    request.extensions_mut().insert(lookup);
    next.run(request).await
}
