//! The `state` value carried through the provider redirect.
//!
//! Format: `{csrf_nonce}:{percent-encoded return path}:{pkce_verifier}`.
//!
//! Nonces and verifiers are unpadded base64url and never contain `:`; the
//! return path is percent-encoded so its own colons cannot shift the
//! segments. The value carries no MAC. The nonce is also sent as the OIDC
//! `nonce` and checked against the ID token, and the return path is
//! re-sanitized after decoding, so a forged state can neither log anyone in
//! nor redirect off-site.

/// Errors decoding a `state` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Wrong segment count, or an empty nonce or verifier.
    #[error("Malformed authorization state")]
    MalformedState,
}

/// Decoded authorization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationState {
    /// CSRF binding nonce (also the OIDC nonce).
    pub csrf_nonce: String,
    /// Where to send the user after login. Always a same-origin path.
    pub return_path: String,
    /// PKCE code verifier.
    pub pkce_verifier: String,
}

impl AuthorizationState {
    /// Creates a state value; `return_path` is sanitized.
    #[must_use]
    pub fn new(
        csrf_nonce: impl Into<String>,
        return_path: &str,
        pkce_verifier: impl Into<String>,
    ) -> Self {
        Self {
            csrf_nonce: csrf_nonce.into(),
            return_path: sanitize_return_path(return_path),
            pkce_verifier: pkce_verifier.into(),
        }
    }

    /// Serializes the state for the `state` query parameter.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            self.csrf_nonce,
            urlencoding::encode(&self.return_path),
            self.pkce_verifier
        )
    }

    /// Parses a `state` value returned on the callback.
    ///
    /// An undecodable or unsafe return path falls back to `/`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MalformedState`] unless there are exactly three
    /// segments with a non-empty nonce and verifier.
    pub fn decode(raw: &str) -> Result<Self, StateError> {
        let segments: Vec<&str> = raw.split(':').collect();
        let [nonce, path, verifier] = segments.as_slice() else {
            return Err(StateError::MalformedState);
        };
        if nonce.is_empty() || verifier.is_empty() {
            return Err(StateError::MalformedState);
        }

        let return_path = urlencoding::decode(path)
            .map(|p| sanitize_return_path(&p))
            .unwrap_or_else(|_| "/".to_string());

        Ok(Self {
            csrf_nonce: (*nonce).to_string(),
            return_path,
            pkce_verifier: (*verifier).to_string(),
        })
    }
}

/// Reduces a requested destination to a same-origin path.
///
/// Accepts only values starting with a single `/`. Protocol-relative
/// (`//host`), backslash tricks and control characters all yield `/`.
#[must_use]
pub fn sanitize_return_path(candidate: &str) -> String {
    let safe = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.contains('\\')
        && !candidate.chars().any(char::is_control);
    if safe {
        candidate.to_string()
    } else {
        "/".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: &str = "nE2cdBAl0hV4g3pQ5cOeZqkX1mFqfE3sJtUdZ0yW9rk";
    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

    #[test]
    fn test_state_round_trip() {
        let state = AuthorizationState::new(NONCE, "/dashboard", VERIFIER);
        let decoded = AuthorizationState::decode(&state.encode()).unwrap();
        assert_eq!(decoded.csrf_nonce, NONCE);
        assert_eq!(decoded.return_path, "/dashboard");
        assert_eq!(decoded.pkce_verifier, VERIFIER);
    }

    #[test]
    fn test_path_with_colons_and_query() {
        let state = AuthorizationState::new(NONCE, "/search?q=a:b&x=1", VERIFIER);
        let encoded = state.encode();
        assert_eq!(encoded.matches(':').count(), 2);
        assert_eq!(
            AuthorizationState::decode(&encoded).unwrap().return_path,
            "/search?q=a:b&x=1"
        );
    }

    #[test]
    fn test_wrong_segment_count() {
        assert_eq!(
            AuthorizationState::decode("a:b"),
            Err(StateError::MalformedState)
        );
        assert_eq!(
            AuthorizationState::decode("a:b:c:d"),
            Err(StateError::MalformedState)
        );
        assert_eq!(AuthorizationState::decode(""), Err(StateError::MalformedState));
    }

    #[test]
    fn test_empty_nonce_or_verifier() {
        assert_eq!(
            AuthorizationState::decode(":%2F:v"),
            Err(StateError::MalformedState)
        );
        assert_eq!(
            AuthorizationState::decode("n:%2F:"),
            Err(StateError::MalformedState)
        );
    }

    #[test]
    fn test_bad_path_falls_back_to_root() {
        assert_eq!(AuthorizationState::decode("n::v").unwrap().return_path, "/");
        // Invalid UTF-8 after percent-decoding.
        assert_eq!(AuthorizationState::decode("n:%FF:v").unwrap().return_path, "/");
        assert_eq!(
            AuthorizationState::decode("n:https%3A%2F%2Fevil.example:v")
                .unwrap()
                .return_path,
            "/"
        );
        assert_eq!(
            AuthorizationState::decode("n:%2F%2Fevil.example:v")
                .unwrap()
                .return_path,
            "/"
        );
    }

    #[test]
    fn test_sanitize_return_path() {
        assert_eq!(sanitize_return_path("/profile"), "/profile");
        assert_eq!(sanitize_return_path("/admin/reports?x=1"), "/admin/reports?x=1");
        assert_eq!(sanitize_return_path(""), "/");
        assert_eq!(sanitize_return_path("profile"), "/");
        assert_eq!(sanitize_return_path("//evil.example"), "/");
        assert_eq!(sanitize_return_path("/\\evil.example"), "/");
        assert_eq!(sanitize_return_path("https://evil.example/"), "/");
        assert_eq!(sanitize_return_path("/a\r\nSet-Cookie: x"), "/");
    }

    #[test]
    fn test_new_sanitizes() {
        let state = AuthorizationState::new(NONCE, "//evil.example", VERIFIER);
        assert_eq!(state.return_path, "/");
    }
}
