//! Error types for session token handling.

/// Errors that can occur while reading or verifying a session.
///
/// Every variant is a terminal verdict: no partial trust is extended past a
/// failed check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session cookie was presented.
    #[error("No session")]
    NoSession,

    /// The token is structurally malformed or forward-dated.
    #[error("Invalid session token")]
    InvalidToken,

    /// The token's MAC (or declared algorithm) does not check out.
    #[error("Invalid session signature")]
    InvalidSignature,

    /// The token has passed its expiry time.
    #[error("Session token has expired")]
    ExpiredToken,

    /// The payload was authentic but does not have the expected shape.
    #[error("Malformed session payload")]
    MalformedPayload,

    /// The claims could not be serialized while signing.
    #[error("Failed to encode session: {0}")]
    Encoding(String),

    /// The signing key is unusable.
    #[error("Invalid session key: {0}")]
    InvalidKey(String),
}

impl SessionError {
    /// Returns the stable snake_case code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::InvalidToken => "invalid_token",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredToken => "expired_token",
            Self::MalformedPayload => "malformed_payload",
            Self::Encoding(_) => "encoding_failed",
            Self::InvalidKey(_) => "invalid_key",
        }
    }

    /// Returns `true` if the caller simply has no session.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NoSession)
    }

    /// Returns `true` if a token was presented but rejected.
    ///
    /// Rejections are worth logging; a missing session is not.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::InvalidSignature | Self::ExpiredToken | Self::MalformedPayload
        )
    }
}
