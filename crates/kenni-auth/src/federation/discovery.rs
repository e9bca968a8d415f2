//! OpenID Connect discovery for the configured issuer.
//!
//! Provider metadata is fetched from
//! `{issuer}/.well-known/openid-configuration` and cached for a fixed TTL.
//! The issuer in the document must match the configured issuer exactly
//! (ignoring a trailing slash), and only HTTPS issuers are accepted unless
//! `allow_http` is set for local development.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

/// Provider metadata used by the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// URL that the provider asserts as its Issuer Identifier.
    pub issuer: String,

    /// Authorization endpoint.
    pub authorization_endpoint: String,

    /// Token endpoint.
    pub token_endpoint: String,

    /// JWKS document.
    pub jwks_uri: String,

    /// UserInfo endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// RP-initiated logout endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,

    /// ID token signing algorithms the provider may use.
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// PKCE methods the provider supports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,
}

/// Configuration for discovery fetching and caching.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Time-to-live for the cached document (default: 1 hour).
    pub ttl: Duration,

    /// Maximum response size in bytes (default: 1 MB).
    pub max_response_size: usize,

    /// Whether to allow HTTP (non-HTTPS) issuer URLs.
    pub allow_http: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_response_size: 1024 * 1024,
            allow_http: false,
        }
    }
}

impl DiscoveryConfig {
    /// Sets the cache TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Allows HTTP (non-HTTPS) issuer URLs.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }
}

/// Errors that can occur during OIDC discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// A network error occurred while fetching the discovery document.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The HTTP request returned a non-success status code.
    #[error("HTTP error: status {0}")]
    HttpError(u16),

    /// The discovery document could not be parsed as JSON.
    #[error("Failed to parse discovery document: {0}")]
    ParseError(String),

    /// The issuer in the document is not a valid URL.
    #[error("Invalid issuer URL: {0}")]
    InvalidIssuer(String),

    /// The issuer in the discovery document does not match the expected issuer.
    #[error("Issuer mismatch: expected {expected}, got {actual}")]
    IssuerMismatch {
        /// The expected issuer URL.
        expected: String,
        /// The actual issuer URL from the discovery document.
        actual: String,
    },

    /// The issuer URL scheme is not allowed.
    #[error("Invalid URL scheme: {0} (only HTTPS is allowed)")]
    InvalidScheme(String),

    /// The response exceeded the maximum allowed size.
    #[error("Response exceeds maximum size of {max_size} bytes")]
    ResponseTooLarge {
        /// The maximum allowed size.
        max_size: usize,
    },
}

struct CachedMetadata {
    metadata: ProviderMetadata,
    fetched_at: Instant,
}

/// Cached discovery for a single issuer.
pub struct DiscoveryCache {
    issuer: Url,
    http_client: reqwest::Client,
    config: DiscoveryConfig,
    cached: RwLock<Option<CachedMetadata>>,
}

impl DiscoveryCache {
    /// Creates a cache for `issuer` using the given HTTP client.
    #[must_use]
    pub fn new(issuer: Url, http_client: reqwest::Client, config: DiscoveryConfig) -> Self {
        Self {
            issuer,
            http_client,
            config,
            cached: RwLock::new(None),
        }
    }

    /// Returns the configured issuer.
    #[must_use]
    pub fn issuer(&self) -> &Url {
        &self.issuer
    }

    /// Gets the provider metadata, fetching it if absent or stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be fetched, parsed or
    /// validated.
    pub async fn get(&self) -> Result<ProviderMetadata, DiscoveryError> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref()
                && entry.fetched_at.elapsed() < self.config.ttl
            {
                tracing::trace!(issuer = %self.issuer, "Discovery cache hit");
                return Ok(entry.metadata.clone());
            }
        }

        let metadata = self.discover().await?;

        let mut cached = self.cached.write().await;
        *cached = Some(CachedMetadata {
            metadata: metadata.clone(),
            fetched_at: Instant::now(),
        });

        Ok(metadata)
    }

    /// Drops the cached document.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        tracing::debug!(issuer = %self.issuer, "Invalidated discovery cache");
    }

    async fn discover(&self) -> Result<ProviderMetadata, DiscoveryError> {
        self.validate_issuer_scheme()?;
        let discovery_url = build_discovery_url(&self.issuer);

        tracing::debug!(url = %discovery_url, "Fetching OIDC discovery document");

        let response = self
            .http_client
            .get(discovery_url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(issuer = %self.issuer, error = %e, "Failed to fetch OIDC discovery");
                DiscoveryError::NetworkError(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(DiscoveryError::HttpError(response.status().as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_response_size
        {
            return Err(DiscoveryError::ResponseTooLarge {
                max_size: self.config.max_response_size,
            });
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))?;

        validate_issuer(&metadata, &self.issuer)?;
        Ok(metadata)
    }

    fn validate_issuer_scheme(&self) -> Result<(), DiscoveryError> {
        match self.issuer.scheme() {
            "https" => Ok(()),
            "http" if self.config.allow_http => Ok(()),
            other => Err(DiscoveryError::InvalidScheme(other.to_string())),
        }
    }
}

/// `{issuer}/.well-known/openid-configuration`, keeping any issuer path.
fn build_discovery_url(issuer: &Url) -> Url {
    let mut url = issuer.clone();
    let path = issuer.path().trim_end_matches('/');
    url.set_path(&format!("{path}/.well-known/openid-configuration"));
    url
}

fn validate_issuer(metadata: &ProviderMetadata, expected: &Url) -> Result<(), DiscoveryError> {
    let actual = Url::parse(&metadata.issuer)
        .map_err(|e| DiscoveryError::InvalidIssuer(format!("{}: {e}", metadata.issuer)))?;

    let expected = expected.as_str().trim_end_matches('/');
    let actual = actual.as_str().trim_end_matches('/');
    if expected != actual {
        return Err(DiscoveryError::IssuerMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
