//! fitgen error types

use std::fmt;
use std::time::Duration;

/// Coarse classification of a failure, used for fallback decisions and for
/// the HTTP status reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    NotFound,
    Overloaded,
    RateLimited,
    MalformedUpstreamResponse,
    Unknown,
}

impl ErrorKind {
    /// HTTP status code reported at the API boundary.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::RateLimited => 429,
            ErrorKind::Overloaded => 503,
            ErrorKind::MalformedUpstreamResponse | ErrorKind::Unknown => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid-input",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Overloaded => "overloaded",
            ErrorKind::RateLimited => "rate-limited",
            ErrorKind::MalformedUpstreamResponse => "malformed-response",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// fitgen error types
#[derive(Debug, thiserror::Error)]
pub enum FitgenError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Every candidate failed with a retryable error.
    #[error(
        "all {} candidate models failed (tried: {}); last failure: {last}",
        .tried.len(),
        .tried.join(", ")
    )]
    Exhausted {
        tried: Vec<String>,
        last: ErrorKind,
        retry_after: Option<Duration>,
    },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not parse model output, please retry: {0}")]
    MalformedResponse(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for FitgenError {
    fn from(err: reqwest::Error) -> Self {
        FitgenError::Http(err.to_string())
    }
}

impl FitgenError {
    /// Map a non-success upstream HTTP status to an error.
    ///
    /// `retry_after` is the parsed `Retry-After` header, if the response had one.
    pub fn from_status(
        status: u16,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        let message = message.into();
        match status {
            401 | 403 => FitgenError::AuthenticationFailed,
            404 => FitgenError::ModelNotFound(message),
            429 => FitgenError::RateLimited { retry_after },
            503 => FitgenError::Overloaded(message),
            _ => FitgenError::Api { status, message },
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FitgenError::InvalidInput(_) => ErrorKind::InvalidInput,
            FitgenError::AuthenticationFailed => ErrorKind::Unauthorized,
            FitgenError::ModelNotFound(_) => ErrorKind::NotFound,
            // upstream 400: the model rejected the request shape (unsupported model/feature)
            FitgenError::Api { status: 400, .. } => ErrorKind::NotFound,
            FitgenError::Overloaded(_) => ErrorKind::Overloaded,
            FitgenError::RateLimited { .. } => ErrorKind::RateLimited,
            FitgenError::Exhausted { last, .. } => *last,
            FitgenError::MalformedResponse(_) | FitgenError::EmptyResponse => {
                ErrorKind::MalformedUpstreamResponse
            }
            FitgenError::Http(_)
            | FitgenError::Api { .. }
            | FitgenError::Json(_)
            | FitgenError::Storage(_)
            | FitgenError::Configuration(_)
            | FitgenError::NotConfigured(_) => ErrorKind::Unknown,
        }
    }

    /// Upstream HTTP status, when the error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FitgenError::Api { status, .. } => Some(*status),
            FitgenError::AuthenticationFailed => Some(401),
            FitgenError::ModelNotFound(_) => Some(404),
            FitgenError::RateLimited { .. } => Some(429),
            FitgenError::Overloaded(_) => Some(503),
            _ => None,
        }
    }

    /// Provider-suggested wait before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FitgenError::RateLimited { retry_after } => *retry_after,
            FitgenError::Exhausted { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for fitgen operations
pub type Result<T> = std::result::Result<T, FitgenError>;
