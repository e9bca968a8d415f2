//! Stateless signed sessions.
//!
//! A session is a compact HMAC-SHA256 token held in an HTTP-only cookie. All
//! session state lives in the token; nothing is stored server-side, so a
//! session ends only when the cookie is deleted or the token expires.
//!
//! - [`SessionCodec`] signs and verifies tokens
//! - [`SessionGateway`] moves tokens in and out of the cookie jar
//! - [`SessionLookup`] is the verdict for one request
//! - [`Clock`] lets tests pin the current time

pub mod claims;
pub mod clock;
pub mod codec;
pub mod error;
pub mod gateway;
pub mod lookup;

pub use claims::{Role, SessionClaims, SessionPrincipal};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{
    DEFAULT_CLOCK_SKEW, DEFAULT_SESSION_TTL, MAX_SESSION_TTL, MIN_SECRET_LEN, MIN_SESSION_TTL,
    SESSION_ALGORITHM, SessionCodec, SignedSession,
};
pub use error::SessionError;
pub use gateway::SessionGateway;
pub use lookup::SessionLookup;
