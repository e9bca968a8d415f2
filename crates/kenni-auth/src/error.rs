//! Crate-level error type.
//!
//! Module errors ([`SessionError`], [`FlowError`], [`StorageError`], ...) are
//! precise. [`AuthError`] gathers them for callers that only need to report a
//! failure, and renders them as JSON API errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::config::ConfigError;
use crate::federation::IdpError;
use crate::flow::FlowError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// Errors surfaced by the authentication API.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request has no usable session.
    #[error("Unauthorized: {code}")]
    Unauthorized {
        /// Machine-readable reason.
        code: String,
    },

    /// The session lacks the required role.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// A session could not be read or written.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A login could not be completed.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// The identity provider could not be set up or reached.
    #[error(transparent)]
    Provider(#[from] IdpError),

    /// The store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The configuration is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl AuthError {
    /// Creates an `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(code: impl Into<String>) -> Self {
        Self::Unauthorized { code: code.into() }
    }

    /// Creates a `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller should log in (again).
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Self::Unauthorized { .. } => true,
            Self::Session(e) => e.is_missing() || e.is_rejection(),
            _ => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_authentication_error() {
            return StatusCode::UNAUTHORIZED;
        }
        match self {
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Provider(e) if e.is_external_error() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for the response body.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Unauthorized { code } => code.clone(),
            Self::Forbidden { .. } => "forbidden".to_string(),
            Self::Session(e) => e.code().to_string(),
            Self::Flow(e) => e.code().to_string(),
            Self::Provider(_) => "provider_error".to_string(),
            Self::Storage(_) => "storage_error".to_string(),
            Self::Configuration(_) => "configuration_error".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication request failed");
        }

        let title = status.canonical_reason().unwrap_or("Error");
        let body = json!({
            "error": title,
            "code": self.code(),
        });
        (status, Json(body)).into_response()
    }
}
