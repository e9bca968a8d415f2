//! PKCE (Proof Key for Code Exchange) for the client side of the login flow.
//!
//! Implements RFC 7636 with the S256 method only. A verifier is generated per
//! login attempt, its challenge is sent with the authorization request, and
//! the verifier itself travels back through `state` to the token request.
//!
//! # Example
//!
//! ```
//! use kenni_auth::oauth::{PkceChallenge, PkceVerifier};
//!
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier);
//! assert_eq!(challenge.as_str().len(), 43);
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when accepting a verifier from the outside.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the valid range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains invalid characters.
    #[error("Invalid verifier characters: must be URL-safe ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,
}

impl PkceError {
    /// Create an `InvalidVerifierLength` error.
    #[must_use]
    pub fn invalid_verifier_length(len: usize) -> Self {
        Self::InvalidVerifierLength(len)
    }

    /// Create an `InvalidVerifierCharacters` error.
    #[must_use]
    pub fn invalid_verifier_characters() -> Self {
        Self::InvalidVerifierCharacters
    }
}

// =============================================================================
// PKCE Challenge Method
// =============================================================================

/// PKCE challenge method. Only S256 is ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PkceChallengeMethod {
    /// SHA-256 hash.
    #[default]
    S256,
}

impl PkceChallengeMethod {
    /// Get the method as it appears in `code_challenge_method`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PKCE Verifier
// =============================================================================

/// PKCE code verifier.
///
/// Uses only the unreserved characters `[A-Za-z0-9-._~]`, which also keeps it
/// free of the `:` separator used by the state codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Accept a verifier recovered from the callback `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Length is not between 43 and 128 characters
    /// - Contains characters other than `[A-Za-z0-9-._~]`
    pub fn new(verifier: impl Into<String>) -> Result<Self, PkceError> {
        let verifier = verifier.into();
        let len = verifier.len();

        if !(43..=128).contains(&len) {
            return Err(PkceError::invalid_verifier_length(len));
        }

        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
        {
            return Err(PkceError::invalid_verifier_characters());
        }

        Ok(Self(verifier))
    }

    /// Generate a cryptographically random verifier.
    ///
    /// 32 random bytes encoded as base64url (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        Self(random_token())
    }

    /// Get the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the verifier and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PKCE Challenge
// =============================================================================

/// PKCE code challenge: `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Derive the S256 challenge for a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let hash = Sha256::digest(verifier.0.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hash))
    }

    /// The method used to derive this challenge.
    #[must_use]
    pub fn method(&self) -> PkceChallengeMethod {
        PkceChallengeMethod::S256
    }

    /// Get the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PkceChallenge {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 32 random bytes as unpadded base64url (43 characters).
///
/// Used for PKCE verifiers and CSRF/OIDC nonces.
#[must_use]
pub fn random_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    // `gen` is a reserved keyword in Rust 2024
    let bytes: [u8; 32] = rng.r#gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_generation() {
        let verifier = PkceVerifier::generate();
        assert_eq!(verifier.as_str().len(), 43);
        assert!(
            verifier
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        // A generated verifier is accepted back unchanged.
        assert_eq!(PkceVerifier::new(verifier.as_str()).unwrap(), verifier);
    }

    #[test]
    fn test_verifier_generation_uniqueness() {
        let v1 = PkceVerifier::generate();
        let v2 = PkceVerifier::generate();
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_verifier_length_bounds() {
        assert_eq!(
            PkceVerifier::new("a".repeat(42)),
            Err(PkceError::InvalidVerifierLength(42))
        );
        assert!(PkceVerifier::new("a".repeat(43)).is_ok());
        assert!(PkceVerifier::new("a".repeat(128)).is_ok());
        assert_eq!(
            PkceVerifier::new("a".repeat(129)),
            Err(PkceError::InvalidVerifierLength(129))
        );
    }

    #[test]
    fn test_verifier_characters() {
        let valid = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._~";
        assert!(PkceVerifier::new(valid).is_ok());

        let with_colon = format!("{}:", "a".repeat(50));
        assert_eq!(
            PkceVerifier::new(with_colon),
            Err(PkceError::InvalidVerifierCharacters)
        );
    }

    #[test]
    fn test_rfc7636_appendix_b_test_vector() {
        let verifier = PkceVerifier::new("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk").unwrap();
        let challenge = PkceChallenge::from_verifier(&verifier);
        assert_eq!(
            challenge.as_str(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
        assert_eq!(challenge.method().as_str(), "S256");
    }

    #[test]
    fn test_random_token_shape() {
        let token = random_token();
        assert_eq!(token.len(), 43);
        assert!(!token.contains(':'));
        assert_ne!(token, random_token());
    }
}
