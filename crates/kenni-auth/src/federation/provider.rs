//! The identity provider seam.
//!
//! The login flow only talks to Kenni through [`IdentityProvider`]. The
//! production implementation is [`OidcClient`](super::oidc::OidcClient);
//! tests substitute a scripted provider.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::error::IdpError;
use crate::oauth::{PkceChallenge, PkceVerifier};

/// Tokens returned by the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    /// The ID token (JWT).
    pub id_token: String,

    /// The access token.
    pub access_token: String,

    /// The token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,

    /// Token expiration in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Optional refresh token (never used; sessions are not refreshed).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// A verified identity asserted by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIdentity {
    /// The provider's subject identifier.
    pub subject: String,

    /// Full name as registered with the national registry.
    pub full_name: String,

    /// The kennitala, as asserted.
    pub national_id: String,

    /// All ID token claims, kept for the login audit record.
    pub raw_claims: serde_json::Value,
}

/// Operations the login flow needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the URL to redirect the browser to.
    async fn authorization_url(
        &self,
        state: &str,
        nonce: &str,
        challenge: &PkceChallenge,
    ) -> Result<Url, IdpError>;

    /// Exchanges an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<TokenSet, IdpError>;

    /// Validates an ID token and extracts the identity it asserts.
    async fn validate_id_token(
        &self,
        id_token: &str,
        expected_nonce: &str,
    ) -> Result<ExternalIdentity, IdpError>;
}
