//! Client details recorded with each login.

use axum::http::{HeaderMap, header};

/// Placeholder stored when a header is missing.
pub const UNKNOWN: &str = "unknown";

/// Where a request came from, as far as the headers tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client IP address, or [`UNKNOWN`].
    pub ip_address: String,
    /// `User-Agent` header, or [`UNKNOWN`].
    pub user_agent: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            ip_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
        }
    }
}

impl ClientInfo {
    /// Extracts client details from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers).unwrap_or_else(|| UNKNOWN.to_string()),
            user_agent: extract_user_agent(headers).unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Extract the `User-Agent` header value.
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extract the client IP address from proxy headers.
///
/// `X-Forwarded-For` may list `client, proxy1, proxy2`; the first entry is
/// the client. `X-Real-IP` is the fallback.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(client_ip) = value.split(',').next().map(str::trim)
        && !client_ip.is_empty()
    {
        return Some(client_ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
