//! Error types for the farmhand client.
//!
//! This module provides a unified error type with explicit variants for
//! network, HTTP status, authentication, storage and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for farmhand operations.
///
/// Callers match on the variant to tell a request that the backend rejected
/// (`Status`) apart from a session that could not be restored (`Auth`).
#[derive(Debug, Error)]
pub enum Error {
    /// Network errors (DNS, TLS, connection, timeout).
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// A non-2xx response that was not resolved by a token refresh.
    #[error("request failed: {0}")]
    Status(#[from] StatusError),

    /// Authentication errors (bad credentials, refresh failure, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Credential persistence errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (bad URL, bad header value).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A request body could not be encoded or a response body decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation was cancelled by its cancellation token.
    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the HTTP status if this error came from a backend response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status(err) => Some(err.status),
            _ => None,
        }
    }

    /// Whether this error ended the session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionExpired))
    }
}

/// Network-level errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request exceeded its deadline.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP client error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout { duration_ms: 0 }
        } else if err.is_connect() {
            NetworkError::Connection {
                message: err.to_string(),
            }
        } else {
            NetworkError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(NetworkError::from(err))
    }
}

/// A non-2xx response from the backend.
///
/// The body is kept verbatim so field-level validation messages reach the
/// caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body (may be empty).
    pub body: String,
}

impl StatusError {
    /// Create a new status error.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the backend rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if !self.body.is_empty() {
            write!(f, ": {}", self.body)?;
        }
        Ok(())
    }
}

impl std::error::Error for StatusError {}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token endpoint rejected the username/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No refresh token is stored, so the session cannot be renewed.
    #[error("no refresh token available")]
    RefreshTokenMissing,

    /// The refresh endpoint refused or failed to mint a new access token.
    #[error("token refresh failed: {reason}")]
    RefreshRejected { reason: String },

    /// The session was terminated after a failed refresh.
    #[error("session expired")]
    SessionExpired,
}

/// Credential persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The stored credential file could not be parsed or written.
    #[error("corrupt credential file {path}: {message}")]
    Format { path: String, message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A token contains characters that cannot appear in an HTTP header.
    #[error("token is not a valid header value")]
    TokenFormat,

    /// Unknown resource collection name.
    #[error("unknown resource '{value}'")]
    Resource { value: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
