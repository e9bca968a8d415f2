//! Authentication configuration.
//!
//! Every section deserializes with `#[serde(default)]`, so a configuration
//! file only needs to name the values it changes. The session secret and the
//! provider credentials have no usable defaults and are checked by
//! [`AuthConfig::validate`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::session::codec::{MAX_SESSION_TTL, MIN_SECRET_LEN, MIN_SESSION_TTL};

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// session_secret = "change-me-to-at-least-32-bytes-of-entropy"
///
/// [auth.provider]
/// issuer_url = "https://idp.kenni.is/acme"
/// client_id = "acme-web"
/// client_secret = "..."
/// redirect_uri = "https://acme.is/api/auth/callback"
///
/// [auth.session]
/// ttl = "7d"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Symmetric secret used to sign session tokens.
    pub session_secret: String,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Kenni (OIDC provider) settings.
    pub provider: ProviderConfig,

    /// National identifier handling.
    pub identity: IdentityConfig,

    /// Login and redirect paths.
    pub routes: RoutesConfig,

    /// One-shot notice cookies.
    pub notices: NoticeConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Session lifetime. Also used as the cookie max-age.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// Force the `Secure` cookie attribute on or off.
    /// When unset, it follows the deployment environment.
    pub secure: Option<bool>,

    /// How far in the future a token's issue time may lie.
    #[serde(with = "humantime_serde")]
    pub clock_skew: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "acme-session".to_string(),
            ttl: Duration::from_secs(7 * 24 * 3600), // 7 days
            secure: None,
            clock_skew: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// Resolves the `Secure` attribute, falling back to `production`.
    #[must_use]
    pub fn secure_or(&self, production: bool) -> bool {
        self.secure.unwrap_or(production)
    }
}

/// Kenni provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Issuer URL; discovery is fetched from
    /// `{issuer_url}/.well-known/openid-configuration`.
    pub issuer_url: String,

    /// OAuth client ID registered with Kenni.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Callback URL registered with Kenni.
    pub redirect_uri: String,

    /// Scopes requested at login.
    pub scopes: Vec<String>,

    /// ID token signing algorithms accepted from the provider.
    pub allowed_algorithms: Vec<String>,

    /// Claim holding the kennitala.
    pub national_id_claim: String,

    /// Claim holding the full name.
    pub name_claim: String,

    /// Leeway for `exp`/`iat` checks on ID tokens.
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,

    /// Timeout for discovery, JWKS and token requests.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// How long discovery metadata is cached.
    #[serde(with = "humantime_serde")]
    pub discovery_cache_ttl: Duration,

    /// How long the provider's JWKS is cached.
    #[serde(with = "humantime_serde")]
    pub jwks_cache_ttl: Duration,

    /// Allow a plain-HTTP issuer (local development only).
    pub allow_http: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            issuer_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "national_id".to_string(),
            ],
            allowed_algorithms: vec!["RS256".to_string()],
            national_id_claim: "national_id".to_string(),
            name_claim: "name".to_string(),
            leeway: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            discovery_cache_ttl: Duration::from_secs(3600), // 1 hour
            jwks_cache_ttl: Duration::from_secs(3600),      // 1 hour
            allow_http: false,
        }
    }
}

/// National identifier configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Verify the kennitala mod-11 check digit.
    pub verify_checksum: bool,
}

/// Redirect targets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Login page that guards redirect to.
    pub login_path: String,

    /// Destination after login when none was requested.
    pub default_return_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            default_return_path: "/".to_string(),
        }
    }
}

/// Notice cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Lifetime of a notice cookie.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(5 * 60),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the session secret or a provider
    /// credential is absent, and `ConfigError::InvalidValue` if:
    /// - The session secret is shorter than 32 bytes
    /// - The issuer or redirect URI does not parse, or the issuer is plain
    ///   HTTP without `allow_http`
    /// - No ID token algorithm is allowed, or one is unknown
    /// - The session TTL is under one second or over ten years
    /// - A route path is not absolute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secret.is_empty() {
            return Err(ConfigError::Missing("auth.session_secret".to_string()));
        }
        if self.session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "auth.session_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        if self.session.ttl < MIN_SESSION_TTL {
            return Err(ConfigError::InvalidValue(
                "auth.session.ttl must be at least 1s".to_string(),
            ));
        }
        if self.session.ttl > MAX_SESSION_TTL {
            return Err(ConfigError::InvalidValue(format!(
                "auth.session.ttl must be at most {} days",
                MAX_SESSION_TTL.as_secs() / 86_400
            )));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.session.cookie_name cannot be empty".to_string(),
            ));
        }

        self.provider.validate()?;

        for (name, path) in [
            ("auth.routes.login_path", &self.routes.login_path),
            (
                "auth.routes.default_return_path",
                &self.routes.default_return_path,
            ),
        ] {
            if !path.starts_with('/') || path.starts_with("//") {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be an absolute path, got '{path}'"
                )));
            }
        }

        Ok(())
    }
}

impl ProviderConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("auth.provider.issuer_url", &self.issuer_url),
            ("auth.provider.client_id", &self.client_id),
            ("auth.provider.redirect_uri", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name.to_string()));
            }
        }

        let issuer = url::Url::parse(&self.issuer_url).map_err(|e| {
            ConfigError::InvalidValue(format!("auth.provider.issuer_url: {e}"))
        })?;
        if issuer.scheme() != "https" && !self.allow_http {
            return Err(ConfigError::InvalidValue(
                "auth.provider.issuer_url must use HTTPS".to_string(),
            ));
        }
        url::Url::parse(&self.redirect_uri).map_err(|e| {
            ConfigError::InvalidValue(format!("auth.provider.redirect_uri: {e}"))
        })?;

        if self.allowed_algorithms.is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.provider.allowed_algorithms cannot be empty".to_string(),
            ));
        }
        for alg in &self.allowed_algorithms {
            if alg.parse::<jsonwebtoken::Algorithm>().is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "Unknown ID token algorithm: '{alg}'"
                )));
            }
        }

        if !self.scopes.iter().any(|s| s == "openid") {
            return Err(ConfigError::InvalidValue(
                "auth.provider.scopes must include 'openid'".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn valid_config() -> AuthConfig {
        AuthConfig {
            session_secret: "0123456789abcdef0123456789abcdef".to_string(),
            provider: ProviderConfig {
                issuer_url: "https://idp.kenni.is/acme".to_string(),
                client_id: "acme-web".to_string(),
                client_secret: "secret".to_string(),
                redirect_uri: "https://acme.is/api/auth/callback".to_string(),
                ..ProviderConfig::default()
            },
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session.cookie_name, "acme-session");
        assert_eq!(config.session.ttl, Duration::from_secs(604_800));
        assert_eq!(config.session.clock_skew, Duration::from_secs(60));
        assert_eq!(config.routes.login_path, "/login");
        assert_eq!(config.notices.max_age, Duration::from_secs(300));
        assert!(!config.identity.verify_checksum);
        assert_eq!(config.provider.national_id_claim, "national_id");
    }

    #[test]
    fn test_valid_config_validates() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_secret() {
        let mut config = valid_config();
        config.session_secret = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing("auth.session_secret".to_string()))
        );
    }

    #[test]
    fn test_short_secret() {
        let mut config = valid_config();
        config.session_secret = "short".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn test_http_issuer_requires_opt_in() {
        let mut config = valid_config();
        config.provider.issuer_url = "http://localhost:9000".to_string();
        assert!(config.validate().is_err());

        config.provider.allow_http = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_client_id() {
        let mut config = valid_config();
        config.provider.client_id = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing("auth.provider.client_id".to_string()))
        );
    }

    #[test]
    fn test_unknown_algorithm() {
        let mut config = valid_config();
        config.provider.allowed_algorithms = vec!["XX999".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_login_path_rejected() {
        let mut config = valid_config();
        config.routes.login_path = "login".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_ttl_bounds() {
        let mut config = valid_config();
        config.session.ttl = Duration::from_millis(500);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.session.ttl = Duration::from_secs(u64::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.session.ttl = Duration::from_secs(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secure_resolution() {
        let mut session = SessionConfig::default();
        assert!(session.secure_or(true));
        assert!(!session.secure_or(false));
        session.secure = Some(false);
        assert!(!session.secure_or(true));
    }

    #[test]
    fn test_partial_deserialize() {
        let config: AuthConfig = serde_json::from_str(
            r#"{"session_secret":"x","session":{"ttl":"1h"},"identity":{"verify_checksum":true}}"#,
        )
        .unwrap();
        assert_eq!(config.session.ttl, Duration::from_secs(3600));
        assert_eq!(config.session.cookie_name, "acme-session");
        assert!(config.identity.verify_checksum);
    }
}
