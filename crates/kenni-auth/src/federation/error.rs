//! Error types for identity provider operations.

use super::discovery::DiscoveryError;
use super::jwks::JwksError;

/// Errors that can occur while talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    /// Failed to fetch the OIDC discovery document.
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(#[from] DiscoveryError),

    /// Failed to fetch or use the provider's JWKS.
    #[error("JWKS error: {0}")]
    JwksFailed(#[from] JwksError),

    /// Token exchange with the provider failed.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// ID token validation failed.
    #[error("Token validation failed: {0}")]
    TokenValidationFailed(String),

    /// The ID token's algorithm is not on the allow-list.
    #[error("ID token algorithm not allowed: {0}")]
    AlgorithmNotAllowed(String),

    /// The nonce in the ID token doesn't match the expected nonce.
    #[error("Nonce mismatch: ID token nonce does not match expected nonce")]
    NonceMismatch,

    /// A claim required to identify the user is missing or empty.
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// A network error occurred.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Failed to parse a URL.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// JWT decoding or validation error.
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    /// The provider returned an OAuth error.
    #[error("OAuth error from provider: {error} - {description}")]
    OAuthError {
        /// The OAuth error code.
        error: String,
        /// Optional error description.
        description: String,
    },
}

impl IdpError {
    /// Creates an `OAuthError` from a provider response.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuthError {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Creates a `MissingClaim` error.
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim(claim.into())
    }

    /// Returns `true` if this is an ID token validation error.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::TokenValidationFailed(_)
                | Self::AlgorithmNotAllowed(_)
                | Self::NonceMismatch
                | Self::MissingClaim(_)
                | Self::JwtError(_)
        )
    }

    /// Returns `true` if this is a network or provider-side error.
    #[must_use]
    pub fn is_external_error(&self) -> bool {
        matches!(
            self,
            Self::DiscoveryFailed(_)
                | Self::JwksFailed(_)
                | Self::TokenExchangeFailed(_)
                | Self::NetworkError(_)
                | Self::OAuthError { .. }
        )
    }
}
