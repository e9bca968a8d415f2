//! Compact signed session tokens.
//!
//! A session token has three dot-separated, base64url (no padding) segments:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url(payload) . base64url(HMAC-SHA256)
//! ```
//!
//! The MAC covers the first two segments exactly as they appear on the wire.
//! Verification checks, in order: structure, declared algorithm, MAC,
//! payload shape, expiry and forward-dated issue time. Each failure maps to a
//! distinct [`SessionError`] and the first failing check wins.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::claims::{ClaimsPayload, SessionClaims, SessionPrincipal};
use super::clock::{Clock, SystemClock};
use super::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// The only accepted signing algorithm.
pub const SESSION_ALGORITHM: &str = "HS256";

/// Default session lifetime: 7 days.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Shortest accepted session lifetime.
pub const MIN_SESSION_TTL: Duration = Duration::from_secs(1);

/// Longest accepted session lifetime: 10 years.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Default tolerance for tokens issued slightly in the future.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Minimum length of the signing secret in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl TokenHeader {
    fn session() -> Self {
        Self {
            alg: SESSION_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// A freshly signed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSession {
    /// The compact token to hand to the client.
    pub token: String,
    /// The claims embedded in the token.
    pub claims: SessionClaims,
}

/// Signs and verifies session tokens with a single symmetric secret.
#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
    ttl_secs: i64,
    max_skew_secs: i64,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("ttl_secs", &self.ttl_secs)
            .field("max_skew_secs", &self.max_skew_secs)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    /// Creates a codec with the default lifetime, skew and system clock.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidKey`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SessionError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::InvalidKey(format!(
                "secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| SessionError::InvalidKey(e.to_string()))?;

        Ok(Self {
            mac,
            ttl_secs: DEFAULT_SESSION_TTL.as_secs() as i64,
            max_skew_secs: DEFAULT_CLOCK_SKEW.as_secs() as i64,
            clock: Arc::new(SystemClock),
        })
    }

    /// Sets the session lifetime, clamped to
    /// [`MIN_SESSION_TTL`]..=[`MAX_SESSION_TTL`].
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        let ttl = ttl.clamp(MIN_SESSION_TTL, MAX_SESSION_TTL);
        self.ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self
    }

    /// Sets the tolerated clock skew for the issue time.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.max_skew_secs = skew.as_secs() as i64;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the session lifetime in seconds.
    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Returns the current time according to the codec's clock.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Mints a session for `principal`, issued now and expiring after the TTL.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encoding`] if the claims cannot be serialized.
    pub fn sign(&self, principal: SessionPrincipal) -> Result<SignedSession, SessionError> {
        let claims = SessionClaims::issue(principal, self.clock.now(), self.ttl_secs);
        let token = self.encode(&claims)?;
        Ok(SignedSession { token, claims })
    }

    /// Encodes and signs the given claims as-is.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encoding`] if the claims cannot be serialized.
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        let header = encode_segment(&TokenHeader::session())?;
        let payload = encode_segment(&ClaimsPayload::from(claims))?;
        Ok(self.seal(&header, &payload))
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidToken`] - not three segments, bad header, or
    ///   issued too far in the future
    /// - [`SessionError::InvalidSignature`] - wrong algorithm or MAC mismatch
    /// - [`SessionError::MalformedPayload`] - authentic payload of the wrong shape
    /// - [`SessionError::ExpiredToken`] - `now >= exp`
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(SessionError::InvalidToken);
        };

        let header: TokenHeader =
            decode_segment(header_b64).ok_or(SessionError::InvalidToken)?;
        if header.alg != SESSION_ALGORITHM {
            return Err(SessionError::InvalidSignature);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SessionError::InvalidSignature)?;
        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::InvalidSignature)?;

        let payload: ClaimsPayload =
            decode_segment(payload_b64).ok_or(SessionError::MalformedPayload)?;
        let claims = SessionClaims::try_from(payload)?;

        let now = self.clock.now();
        if now >= claims.expires_at {
            return Err(SessionError::ExpiredToken);
        }
        if claims.issued_at > now + self.max_skew_secs {
            return Err(SessionError::InvalidToken);
        }

        Ok(claims)
    }

    fn seal(&self, header_b64: &str, payload_b64: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{header_b64}.{payload_b64}.{signature}")
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, SessionError> {
    let json = serde_json::to_vec(value).map_err(|e| SessionError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FixedClock, Role};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const NOW: i64 = 1_700_000_000;
    const TTL: i64 = 7 * 24 * 60 * 60;

    fn codec_at(now: i64) -> (SessionCodec, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let codec = SessionCodec::new(SECRET).unwrap().with_clock(clock.clone());
        (codec, clock)
    }

    fn principal() -> SessionPrincipal {
        SessionPrincipal::new("user-1", "Jón Jónsson", Role::User)
    }

    fn claims(iat: i64, exp: i64) -> SessionClaims {
        SessionClaims {
            subject_id: "user-1".into(),
            display_name: "Jón Jónsson".into(),
            role: Role::User,
            issued_at: iat,
            expires_at: exp,
        }
    }

    fn flip_char(segment: &str, index: usize) -> String {
        segment
            .char_indices()
            .map(|(i, c)| {
                if i == index {
                    if c == 'A' { 'B' } else { 'A' }
                } else {
                    c
                }
            })
            .collect()
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = SessionCodec::new("too-short").unwrap_err();
        assert!(matches!(err, SessionError::InvalidKey(_)));
    }

    #[test]
    fn test_sign_then_verify() {
        let (codec, _) = codec_at(NOW);
        let signed = codec.sign(principal()).unwrap();

        assert_eq!(signed.claims.issued_at, NOW);
        assert_eq!(signed.claims.expires_at, NOW + TTL);

        let claims = codec.verify(&signed.token).unwrap();
        assert_eq!(claims, signed.claims);
        assert_eq!(claims.principal(), principal());
    }

    #[test]
    fn test_header_is_hs256_jwt() {
        let (codec, _) = codec_at(NOW);
        let signed = codec.sign(principal()).unwrap();
        let header_b64 = signed.token.split('.').next().unwrap();
        let header = URL_SAFE_NO_PAD.decode(header_b64).unwrap();
        assert_eq!(header, br#"{"alg":"HS256","typ":"JWT"}"#);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let (codec, _) = codec_at(NOW);
        let token = codec.sign(principal()).unwrap().token;
        let parts: Vec<&str> = token.split('.').collect();

        for index in [0, 7, parts[1].len() / 2, parts[1].len() - 1] {
            let forged = format!("{}.{}.{}", parts[0], flip_char(parts[1], index), parts[2]);
            assert_eq!(codec.verify(&forged), Err(SessionError::InvalidSignature));
        }
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let (codec, _) = codec_at(NOW);
        let token = codec.sign(principal()).unwrap().token;
        let parts: Vec<&str> = token.split('.').collect();

        for index in [0, parts[2].len() / 2, parts[2].len() - 1] {
            let forged = format!("{}.{}.{}", parts[0], parts[1], flip_char(parts[2], index));
            assert_eq!(codec.verify(&forged), Err(SessionError::InvalidSignature));
        }

        let truncated = format!("{}.{}.{}", parts[0], parts[1], &parts[2][..10]);
        assert_eq!(codec.verify(&truncated), Err(SessionError::InvalidSignature));
    }

    #[test]
    fn test_other_secret_rejected() {
        let (codec, _) = codec_at(NOW);
        let token = codec.sign(principal()).unwrap().token;
        let other = SessionCodec::new("ffffffffffffffffffffffffffffffff")
            .unwrap()
            .with_clock(Arc::new(FixedClock::new(NOW)));
        assert_eq!(other.verify(&token), Err(SessionError::InvalidSignature));
    }

    #[test]
    fn test_algorithm_is_pinned() {
        let (codec, _) = codec_at(NOW);
        let payload = encode_segment(&ClaimsPayload::from(&claims(NOW, NOW + TTL))).unwrap();

        for alg in ["none", "HS512", "RS256", "hs256"] {
            let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","typ":"JWT"}}"#));
            // Correct MAC, wrong declared algorithm.
            let token = codec.seal(&header, &payload);
            assert_eq!(codec.verify(&token), Err(SessionError::InvalidSignature));
        }
    }

    #[test]
    fn test_structurally_invalid_tokens() {
        let (codec, _) = codec_at(NOW);
        let token = codec.sign(principal()).unwrap().token;
        let parts: Vec<&str> = token.split('.').collect();

        assert_eq!(codec.verify(""), Err(SessionError::InvalidToken));
        assert_eq!(codec.verify("abc"), Err(SessionError::InvalidToken));
        assert_eq!(codec.verify("a.b"), Err(SessionError::InvalidToken));
        assert_eq!(
            codec.verify(&format!("{token}.extra")),
            Err(SessionError::InvalidToken)
        );
        assert_eq!(
            codec.verify(&format!("!!!.{}.{}", parts[1], parts[2])),
            Err(SessionError::InvalidToken)
        );
        let not_json = URL_SAFE_NO_PAD.encode("not json");
        assert_eq!(
            codec.verify(&format!("{not_json}.{}.{}", parts[1], parts[2])),
            Err(SessionError::InvalidToken)
        );
    }

    #[test]
    fn test_authentic_but_malformed_payload() {
        let (codec, _) = codec_at(NOW);
        let header = encode_segment(&TokenHeader::session()).unwrap();

        let wrong_shape = URL_SAFE_NO_PAD.encode(r#"{"userId":"u1","name":"A"}"#);
        let token = codec.seal(&header, &wrong_shape);
        assert_eq!(codec.verify(&token), Err(SessionError::MalformedPayload));

        let bad_role = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"userId":"u1","name":"A","role":"root","sub":"u1","iat":{NOW},"exp":{}}}"#,
            NOW + TTL
        ));
        let token = codec.seal(&header, &bad_role);
        assert_eq!(codec.verify(&token), Err(SessionError::MalformedPayload));

        let sub_mismatch = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"userId":"u1","name":"A","role":"user","sub":"u2","iat":{NOW},"exp":{}}}"#,
            NOW + TTL
        ));
        let token = codec.seal(&header, &sub_mismatch);
        assert_eq!(codec.verify(&token), Err(SessionError::MalformedPayload));
    }

    #[test]
    fn test_expiry_boundary() {
        let (codec, _) = codec_at(NOW);

        let expired = codec.encode(&claims(NOW - TTL, NOW - 1)).unwrap();
        assert_eq!(codec.verify(&expired), Err(SessionError::ExpiredToken));

        let at_boundary = codec.encode(&claims(NOW - TTL, NOW)).unwrap();
        assert_eq!(codec.verify(&at_boundary), Err(SessionError::ExpiredToken));

        let live = codec.encode(&claims(NOW - TTL, NOW + 1)).unwrap();
        assert!(codec.verify(&live).is_ok());
    }

    #[test]
    fn test_expires_as_clock_advances() {
        let (codec, clock) = codec_at(NOW);
        let token = codec.sign(principal()).unwrap().token;

        clock.advance(TTL - 1);
        assert!(codec.verify(&token).is_ok());
        clock.advance(1);
        assert_eq!(codec.verify(&token), Err(SessionError::ExpiredToken));
    }

    #[test]
    fn test_issued_in_future_skew() {
        let (codec, _) = codec_at(NOW);

        let within = codec.encode(&claims(NOW + 59, NOW + 59 + TTL)).unwrap();
        assert!(codec.verify(&within).is_ok());

        let at_limit = codec.encode(&claims(NOW + 60, NOW + 60 + TTL)).unwrap();
        assert!(codec.verify(&at_limit).is_ok());

        let beyond = codec.encode(&claims(NOW + 61, NOW + 61 + TTL)).unwrap();
        assert_eq!(codec.verify(&beyond), Err(SessionError::InvalidToken));
    }

    #[test]
    fn test_custom_ttl() {
        let clock = Arc::new(FixedClock::new(NOW));
        let codec = SessionCodec::new(SECRET)
            .unwrap()
            .with_ttl(Duration::from_secs(3600))
            .with_clock(clock);
        let signed = codec.sign(principal()).unwrap();
        assert_eq!(signed.claims.expires_at, NOW + 3600);
        assert_eq!(codec.ttl_secs(), 3600);
    }

    #[test]
    fn test_ttl_is_clamped() {
        let clock = Arc::new(FixedClock::new(NOW));
        let codec = SessionCodec::new(SECRET)
            .unwrap()
            .with_ttl(Duration::from_millis(500))
            .with_clock(clock.clone());
        assert_eq!(codec.ttl_secs(), 1);
        let token = codec.sign(principal()).unwrap().token;
        assert!(codec.verify(&token).is_ok());

        let codec = codec.with_ttl(Duration::from_secs(u64::MAX));
        assert_eq!(codec.ttl_secs(), MAX_SESSION_TTL.as_secs() as i64);
        let token = codec.sign(principal()).unwrap().token;
        assert!(codec.verify(&token).is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let (codec, _) = codec_at(NOW);
        let debug = format!("{codec:?}");
        assert!(!debug.contains(SECRET));
    }
}
