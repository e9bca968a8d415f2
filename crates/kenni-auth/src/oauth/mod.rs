//! OAuth 2.0 client-side primitives: PKCE and the redirect `state` value.

pub mod pkce;
pub mod state;

pub use pkce::{PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier, random_token};
pub use state::{AuthorizationState, StateError, sanitize_return_path};
