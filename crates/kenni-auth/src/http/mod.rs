//! HTTP surface.
//!
//! | Method   | Path                 | Handler                     |
//! |----------|----------------------|-----------------------------|
//! | GET      | `/api/auth/login`    | [`handlers::login`]         |
//! | GET      | `/api/auth/callback` | [`handlers::callback`]      |
//! | GET/POST | `/api/auth/logout`   | [`handlers::logout`]        |
//! | GET      | `/api/auth/me`       | [`handlers::me`]            |

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{Router, routing::get};

pub use extractors::{AdminOnly, Authenticated, CurrentAdmin, CurrentUser, MaybeSession};
pub use handlers::{LoginParams, MeResponse};
pub use middleware::session_layer;
pub use state::AuthState;

/// Builds the authentication routes.
///
/// The session lookup middleware is not included; apply
/// [`session_layer`] to the merged application router.
pub fn auth_routes(state: AuthState) -> Router {
    Router::new()
        .route("/api/auth/login", get(handlers::login))
        .route("/api/auth/callback", get(handlers::callback))
        .route(
            "/api/auth/logout",
            get(handlers::logout).post(handlers::logout),
        )
        .route("/api/auth/me", get(handlers::me))
        .with_state(state)
}
