//! Kenni identity provider integration.
//!
//! - [`IdentityProvider`] - the seam the login flow depends on
//! - [`OidcClient`] - discovery, JWKS, code exchange and ID token validation
//! - [`IdpError`] - provider errors

pub mod discovery;
pub mod error;
pub mod jwks;
pub mod oidc;
pub mod provider;

pub use discovery::{DiscoveryCache, DiscoveryConfig, DiscoveryError, ProviderMetadata};
pub use error::IdpError;
pub use jwks::{JwksCache, JwksCacheConfig, JwksError};
pub use oidc::{IdTokenClaims, OidcClient};
pub use provider::{ExternalIdentity, IdentityProvider, TokenSet};
