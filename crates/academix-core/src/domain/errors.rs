//! Error taxonomy for backend communication
//!
//! Every outcome of an API call is classified into one of these variants.
//! The orchestration layer (cache, coalescer, throttle) is error-transparent:
//! it never reinterprets an error, only fans it out identically to all
//! waiters of a request key. Because a single outcome may be delivered to
//! many concurrent callers, `ApiError` is `Clone` and carries transport
//! failures as messages rather than wrapping non-cloneable error types.

use thiserror::Error;

/// Errors that can occur when communicating with the Academix backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A network-level error occurred (no connectivity, DNS, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication credentials are invalid or expired (HTTP 401).
    ///
    /// Recoverable exactly once per call via the token refresh coordinator.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was rejected as invalid (HTTP 400), surfaced verbatim
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code returned by the backend
        status: u16,
        /// Message extracted from the response body, if any
        message: String,
    },

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The credential could not be refreshed; the session has ended.
    ///
    /// Callers must treat this as "logged out": the stored session (token,
    /// profile, authenticated flag) has already been cleared.
    #[error("Session expired, please log in again")]
    SessionExpired,
}

impl ApiError {
    /// Classifies an HTTP status code into an error variant.
    ///
    /// `message` is whatever human-readable text could be extracted from the
    /// response body; it is carried verbatim. Statuses outside the known
    /// ranges map to [`ApiError::Server`].
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ApiError::Validation(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Server { status, message },
        }
    }

    /// Returns true for the one error class the refresh coordinator may
    /// recover locally (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Returns true if this error means the session is gone for good
    pub fn is_session_end(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}
