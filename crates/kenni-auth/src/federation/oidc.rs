//! OIDC client for Kenni.
//!
//! Implements [`IdentityProvider`] against a standards-compliant OpenID
//! provider:
//!
//! 1. **Authorization URL** - authorization code flow with PKCE (S256) and a nonce
//! 2. **Code exchange** - `client_secret_post` at the token endpoint
//! 3. **ID token validation** - signature (JWKS, or the client secret for
//!    allow-listed HMAC algorithms), issuer, audience, expiry, nonce
//! 4. **Identity extraction** - subject, full name and kennitala claims

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use url::Url;

use super::discovery::{DiscoveryCache, DiscoveryConfig, ProviderMetadata};
use super::error::IdpError;
use super::jwks::{JwksCache, JwksCacheConfig};
use super::provider::{ExternalIdentity, IdentityProvider, TokenSet};
use crate::config::ProviderConfig;
use crate::oauth::{PkceChallenge, PkceVerifier};

/// Client for the configured OpenID provider.
pub struct OidcClient {
    config: ProviderConfig,
    redirect_uri: Url,
    allowed_algorithms: Vec<Algorithm>,
    http_client: reqwest::Client,
    discovery: DiscoveryCache,
    jwks: JwksCache,
}

impl OidcClient {
    /// Creates a client from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL or algorithm in the configuration does not
    /// parse, or the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, IdpError> {
        let issuer = Url::parse(&config.issuer_url)?;
        let redirect_uri = Url::parse(&config.redirect_uri)?;
        let allowed_algorithms = config
            .allowed_algorithms
            .iter()
            .map(|alg| alg.parse::<Algorithm>())
            .collect::<Result<Vec<_>, _>>()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let discovery = DiscoveryCache::new(
            issuer,
            http_client.clone(),
            DiscoveryConfig::default()
                .with_ttl(config.discovery_cache_ttl)
                .with_allow_http(config.allow_http),
        );
        let jwks = JwksCache::new(
            http_client.clone(),
            JwksCacheConfig::default()
                .with_default_ttl(config.jwks_cache_ttl)
                .with_allow_http(config.allow_http),
        );

        Ok(Self {
            config,
            redirect_uri,
            allowed_algorithms,
            http_client,
            discovery,
            jwks,
        })
    }

    /// Returns the provider metadata, fetching it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails.
    pub async fn metadata(&self) -> Result<ProviderMetadata, IdpError> {
        Ok(self.discovery.get().await?)
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let issuer = self.config.issuer_url.trim_end_matches('/');
        let mut validation = Validation::new(alg);
        validation.set_audience(&[&self.config.client_id]);
        validation.set_issuer(&[issuer.to_string(), format!("{issuer}/")]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.config.leeway.as_secs();
        validation
    }

    async fn verify_signature(&self, id_token: &str) -> Result<IdTokenClaims, IdpError> {
        let header = decode_header(id_token)?;
        if !self.allowed_algorithms.contains(&header.alg) {
            return Err(IdpError::AlgorithmNotAllowed(format!("{:?}", header.alg)));
        }
        let validation = self.validation(header.alg);

        if matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            let key = DecodingKey::from_secret(self.config.client_secret.as_bytes());
            return Ok(decode::<IdTokenClaims>(id_token, &key, &validation)?.claims);
        }

        let metadata = self.discovery.get().await?;
        let jwks_uri = Url::parse(&metadata.jwks_uri)?;

        if let Some(kid) = header.kid.as_deref() {
            let (key, key_alg) = self.jwks.get_key(&jwks_uri, kid).await?;
            if let Some(key_alg) = key_alg
                && key_alg != header.alg
            {
                return Err(IdpError::TokenValidationFailed(format!(
                    "key {kid} is for {key_alg:?}, token claims {:?}",
                    header.alg
                )));
            }
            return Ok(decode::<IdTokenClaims>(id_token, &key, &validation)?.claims);
        }

        // No kid: accept the first key that verifies.
        let mut last_error = None;
        for (key, _) in self.jwks.signing_keys(&jwks_uri).await? {
            match decode::<IdTokenClaims>(id_token, &key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.map_or_else(
            || IdpError::TokenValidationFailed("no key verified the ID token".to_string()),
            IdpError::from,
        ))
    }

    fn extract_identity(&self, claims: IdTokenClaims) -> Result<ExternalIdentity, IdpError> {
        let raw_claims = serde_json::to_value(&claims)
            .map_err(|e| IdpError::TokenValidationFailed(e.to_string()))?;

        let claim = |name: &str| -> Result<String, IdpError> {
            raw_claims
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .ok_or_else(|| IdpError::missing_claim(name))
        };

        let national_id = claim(&self.config.national_id_claim)?;
        let full_name = claim(&self.config.name_claim)?;

        Ok(ExternalIdentity {
            subject: claims.sub,
            full_name,
            national_id,
            raw_claims,
        })
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    async fn authorization_url(
        &self,
        state: &str,
        nonce: &str,
        challenge: &PkceChallenge,
    ) -> Result<Url, IdpError> {
        let metadata = self.discovery.get().await?;
        let mut url = Url::parse(&metadata.authorization_endpoint)?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.config.client_id);
            params.append_pair("redirect_uri", self.redirect_uri.as_str());
            params.append_pair("scope", &self.config.scopes.join(" "));
            params.append_pair("state", state);
            params.append_pair("nonce", nonce);
            params.append_pair("code_challenge", challenge.as_str());
            params.append_pair("code_challenge_method", challenge.method().as_str());
        }

        tracing::debug!(
            endpoint = %metadata.authorization_endpoint,
            "Built authorization URL"
        );
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<TokenSet, IdpError> {
        let metadata = self.discovery.get().await?;
        let token_endpoint = Url::parse(&metadata.token_endpoint)?;

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", verifier.as_str()),
        ];
        if !self.config.client_secret.is_empty() {
            params.push(("client_secret", self.config.client_secret.as_str()));
        }

        tracing::debug!(endpoint = %token_endpoint, "Exchanging authorization code");

        let response = self
            .http_client
            .post(token_endpoint.as_str())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&body) {
                return Err(IdpError::oauth_error(
                    oauth_error.error,
                    oauth_error.error_description.unwrap_or_default(),
                ));
            }

            return Err(IdpError::TokenExchangeFailed(format!("HTTP {status}")));
        }

        response
            .json::<TokenSet>()
            .await
            .map_err(|e| IdpError::TokenExchangeFailed(format!("invalid token response: {e}")))
    }

    async fn validate_id_token(
        &self,
        id_token: &str,
        expected_nonce: &str,
    ) -> Result<ExternalIdentity, IdpError> {
        let claims = self.verify_signature(id_token).await?;

        if claims.nonce.as_deref() != Some(expected_nonce) {
            return Err(IdpError::NonceMismatch);
        }

        tracing::debug!(subject = %claims.sub, issuer = %claims.iss, "Validated ID token");
        self.extract_identity(claims)
    }
}

/// OAuth error response from the provider.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// ID token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer identifier.
    pub iss: String,

    /// Subject identifier.
    pub sub: String,

    /// Audience (string or array on the wire).
    #[serde(deserialize_with = "deserialize_audience")]
    pub aud: Vec<String>,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,

    /// Nonce value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Every other claim, including the profile claims.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn deserialize_audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => Ok(vec![s]),
        OneOrMany::Many(v) => Ok(v),
    }
}
