//! Error types for authwire.
//!
//! A single [`Error`] covers every failure the request pipeline can surface,
//! with explicit variants so callers can react to the authentication cases
//! (for example by redirecting to a login flow) separately from transport
//! and response failures.
//!
//! Every error type is `Clone`: one failed token refresh is observed by all
//! requests that were waiting on it.

use std::fmt;
use thiserror::Error;

/// The unified error type for authwire operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (no session, failed refresh, rejected session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The server answered with a status that is not a success.
    #[error("invalid response: {0}")]
    Response(#[from] ResponseError),

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A request could not be built from its descriptor.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Persisted session state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Returns true when this is a transport timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(err) if err.is_timeout())
    }

    /// Returns true when the session is no longer usable and the caller
    /// should treat the user as logged out.
    pub fn is_session_ended(&self) -> bool {
        matches!(
            self,
            Error::Auth(
                AuthError::NotLoggedIn
                    | AuthError::AuthorizationFailed { .. }
                    | AuthError::UnauthorizedSession { .. }
            )
        )
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl TransportError {
    /// Returns true for [`TransportError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No token is stored but the request needs one.
    #[error("not logged in")]
    NotLoggedIn,

    /// The stored token carries no refresh credential, so it cannot be refreshed.
    #[error("token has no refresh credential")]
    NoRefreshToken,

    /// A token refresh attempt failed.
    #[error("authorization failed: {source}")]
    AuthorizationFailed {
        #[source]
        source: Box<Error>,
    },

    /// The server kept rejecting the request after a refresh and replay.
    /// The session has been logged out.
    #[error("unauthorized session: {source}")]
    UnauthorizedSession {
        #[source]
        source: Box<Error>,
    },
}

impl AuthError {
    /// Wrap a refresh failure.
    pub fn authorization_failed(source: impl Into<Error>) -> Self {
        AuthError::AuthorizationFailed {
            source: Box::new(source.into()),
        }
    }

    /// Wrap the failure that ended a session.
    pub fn unauthorized_session(source: impl Into<Error>) -> Self {
        AuthError::UnauthorizedSession {
            source: Box::new(source.into()),
        }
    }
}

/// Classification of a non-success response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseErrorKind {
    /// HTTP 400.
    BadRequest,
    /// HTTP 401 that was not recovered by a token refresh.
    Unauthorized,
    /// HTTP 403.
    AccessDenied,
    /// HTTP 404.
    NotFound,
    /// Any other status, including server errors that survived a retry.
    InternalError,
}

impl ResponseErrorKind {
    /// Map a non-success HTTP status to its error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ResponseErrorKind::BadRequest,
            401 => ResponseErrorKind::Unauthorized,
            403 => ResponseErrorKind::AccessDenied,
            404 => ResponseErrorKind::NotFound,
            _ => ResponseErrorKind::InternalError,
        }
    }
}

impl fmt::Display for ResponseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseErrorKind::BadRequest => "bad request",
            ResponseErrorKind::Unauthorized => "unauthorized",
            ResponseErrorKind::AccessDenied => "access denied",
            ResponseErrorKind::NotFound => "not found",
            ResponseErrorKind::InternalError => "internal error",
        };
        f.write_str(name)
    }
}

/// A non-success HTTP response.
#[derive(Debug, Clone)]
pub struct ResponseError {
    /// What kind of failure the status represents.
    pub kind: ResponseErrorKind,
    /// HTTP status code.
    pub status: u16,
    /// Response body text, if any was returned.
    pub message: Option<String>,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} [{}]", self.status, self.kind)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResponseError {}

impl ResponseError {
    /// Create a response error, classifying the status.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self {
            kind: ResponseErrorKind::from_status(status),
            status,
            message,
        }
    }

    /// Build a response error from a status and raw body.
    ///
    /// Empty or non-UTF-8 bodies produce no message.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let message = std::str::from_utf8(body)
            .ok()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self::new(status, message)
    }
}

/// The response body did not decode into the requested type.
#[derive(Debug, Clone, Error)]
#[error("failed to decode response body: {message}")]
pub struct DecodeError {
    pub message: String,
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(DecodeError::from(err))
    }
}

/// Request-building errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// The base URL or path did not form a valid URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// A header name or value is not valid HTTP.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// The request body could not be encoded.
    #[error("invalid body: {reason}")]
    Body { reason: String },
}

/// Token store I/O errors.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
