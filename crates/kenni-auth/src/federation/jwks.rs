//! Provider JWKS fetching and caching.
//!
//! The cache honours `Cache-Control: max-age` from the provider, clamped to
//! configured bounds, and refetches once on an unknown `kid` so key rotation
//! at the provider is picked up without waiting for expiry.

use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;
use url::Url;

/// Configuration for the JWKS cache.
#[derive(Debug, Clone)]
pub struct JwksCacheConfig {
    /// TTL when Cache-Control is absent (default: 1 hour).
    pub default_ttl: Duration,

    /// Upper bound on any TTL (default: 24 hours).
    pub max_ttl: Duration,

    /// Lower bound on any TTL (default: 5 minutes).
    pub min_ttl: Duration,

    /// Maximum response size in bytes (default: 1 MB).
    pub max_response_size: usize,

    /// Whether to allow HTTP (non-HTTPS) JWKS URIs.
    pub allow_http: bool,
}

impl Default for JwksCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            max_ttl: Duration::from_secs(86400),
            min_ttl: Duration::from_secs(300),
            max_response_size: 1024 * 1024,
            allow_http: false,
        }
    }
}

impl JwksCacheConfig {
    /// Sets the default TTL.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Allows HTTP (non-HTTPS) JWKS URIs.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }
}

/// Errors that can occur during JWKS operations.
#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    /// A network error occurred while fetching the JWKS.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The HTTP request returned a non-success status code.
    #[error("HTTP error: status {0}")]
    HttpError(u16),

    /// The JWKS response could not be parsed as JSON.
    #[error("Failed to parse JWKS: {0}")]
    ParseError(String),

    /// The requested key was not found in the JWKS.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// No signing keys were found in the JWKS.
    #[error("No signing keys found in JWKS")]
    NoSigningKeys,

    /// The JWKS URI scheme is not allowed.
    #[error("Invalid URL scheme: only HTTPS is allowed")]
    InvalidScheme,

    /// The response exceeded the maximum allowed size.
    #[error("Response exceeds maximum size of {max_size} bytes")]
    ResponseTooLarge {
        /// The maximum allowed size.
        max_size: usize,
    },
}

/// A usable verification key.
pub type SigningKey = (DecodingKey, Option<Algorithm>);

struct CachedJwks {
    uri: String,
    jwks: JwkSet,
    expires_at: Instant,
}

/// JWKS cache for the provider's key endpoint.
pub struct JwksCache {
    http_client: reqwest::Client,
    config: JwksCacheConfig,
    cached: RwLock<Option<CachedJwks>>,
}

impl JwksCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: JwksCacheConfig) -> Self {
        Self {
            http_client,
            config,
            cached: RwLock::new(None),
        }
    }

    /// Gets the key with the given `kid`, refetching once on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeyNotFound`] if the key is still absent after
    /// a refresh, or any fetch error.
    pub async fn get_key(&self, jwks_uri: &Url, kid: &str) -> Result<SigningKey, JwksError> {
        if let Some(key) = self.cached_key(jwks_uri, kid).await {
            return Ok(key);
        }

        tracing::debug!(kid, "JWKS cache miss");
        self.refresh(jwks_uri).await?;

        self.cached_key(jwks_uri, kid)
            .await
            .ok_or_else(|| JwksError::KeyNotFound(kid.to_string()))
    }

    /// Gets every signing key, for tokens without a `kid`.
    ///
    /// Keys marked `use: enc` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::NoSigningKeys`] if none are usable, or any fetch
    /// error.
    pub async fn signing_keys(&self, jwks_uri: &Url) -> Result<Vec<SigningKey>, JwksError> {
        if !self.is_fresh(jwks_uri).await {
            self.refresh(jwks_uri).await?;
        }

        let cached = self.cached.read().await;
        let keys: Vec<_> = cached
            .as_ref()
            .map(|entry| {
                entry
                    .jwks
                    .keys
                    .iter()
                    .filter(|k| !matches!(k.common.public_key_use, Some(PublicKeyUse::Encryption)))
                    .filter_map(to_signing_key)
                    .collect()
            })
            .unwrap_or_default();

        if keys.is_empty() {
            Err(JwksError::NoSigningKeys)
        } else {
            Ok(keys)
        }
    }

    /// Fetches the JWKS and replaces the cached copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme is not allowed, the request fails, or
    /// the body is not a JWKS.
    pub async fn refresh(&self, jwks_uri: &Url) -> Result<(), JwksError> {
        match jwks_uri.scheme() {
            "https" => {}
            "http" if self.config.allow_http => {}
            _ => return Err(JwksError::InvalidScheme),
        }

        tracing::debug!(uri = %jwks_uri, "Fetching JWKS");

        let response = self
            .http_client
            .get(jwks_uri.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(uri = %jwks_uri, error = %e, "Failed to fetch JWKS");
                JwksError::NetworkError(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(JwksError::HttpError(response.status().as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_response_size
        {
            return Err(JwksError::ResponseTooLarge {
                max_size: self.config.max_response_size,
            });
        }

        let ttl = self.ttl_from_headers(response.headers());
        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| JwksError::ParseError(e.to_string()))?;

        tracing::debug!(uri = %jwks_uri, keys = jwks.keys.len(), ?ttl, "Cached JWKS");

        *self.cached.write().await = Some(CachedJwks {
            uri: normalize_uri(jwks_uri),
            jwks,
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }

    async fn is_fresh(&self, jwks_uri: &Url) -> bool {
        let uri = normalize_uri(jwks_uri);
        self.cached
            .read()
            .await
            .as_ref()
            .is_some_and(|entry| entry.uri == uri && Instant::now() < entry.expires_at)
    }

    async fn cached_key(&self, jwks_uri: &Url, kid: &str) -> Option<SigningKey> {
        let uri = normalize_uri(jwks_uri);
        let cached = self.cached.read().await;
        let entry = cached.as_ref()?;
        if entry.uri != uri || Instant::now() >= entry.expires_at {
            return None;
        }
        entry
            .jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .and_then(to_signing_key)
    }

    /// `max-age` from Cache-Control, clamped to the configured bounds.
    fn ttl_from_headers(&self, headers: &reqwest::header::HeaderMap) -> Duration {
        headers
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| {
                v.split(',')
                    .find_map(|d| d.trim().strip_prefix("max-age=")?.parse::<u64>().ok())
            })
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_ttl)
            .min(self.config.max_ttl)
            .max(self.config.min_ttl)
    }
}

fn normalize_uri(uri: &Url) -> String {
    uri.as_str().trim_end_matches('/').to_string()
}

fn to_signing_key(jwk: &Jwk) -> Option<SigningKey> {
    DecodingKey::from_jwk(jwk)
        .ok()
        .map(|key| (key, jwk_algorithm(jwk)))
}

fn jwk_algorithm(jwk: &Jwk) -> Option<Algorithm> {
    jwk.common.key_algorithm.as_ref().and_then(|alg| match alg {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    })
}
