use std::result;

use crate::retry::RetryableError;
use thiserror::Error;

/// Errors raised while executing a single upstream request
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed before a status was received (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// A 2xx body could not be decoded as JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The payload decoded, but not into the shape the caller asked for
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),

    /// The concurrency gate was closed while waiting for a slot
    #[error("Concurrency gate closed")]
    GateClosed,
}

/// Errors raised while turning a raw EFetch document into an article
#[derive(Error, Debug)]
pub enum ParseError {
    /// XML parsing failed
    #[error("XML parsing failed: {0}")]
    XmlError(String),

    /// Invalid PMID format
    #[error("Invalid PMID format: {pmid}")]
    InvalidPmid { pmid: String },
}

/// Errors reported by a cache backend. They are logged and never surfaced.
#[cfg(feature = "cache-redis")]
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type Result<T> = result::Result<T, FetchError>;

impl RetryableError for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // Anything that failed before a status arrived is transport-level
            FetchError::RequestError(err) => !err.is_builder() && !err.is_redirect(),

            FetchError::ApiError { status, .. } => *status == 429 || *status >= 500,

            FetchError::JsonError(_) | FetchError::UnexpectedPayload(_) | FetchError::GateClosed => {
                false
            }
        }
    }

    fn retry_reason(&self) -> &str {
        if self.is_retryable() {
            match self {
                FetchError::RequestError(err) if err.is_timeout() => "Request timeout",
                FetchError::RequestError(err) if err.is_connect() => "Connection error",
                FetchError::RequestError(_) => "Network error",
                FetchError::ApiError { status, .. } => match status {
                    429 => "Rate limit exceeded",
                    _ => "Server error",
                },
                _ => "Transient error",
            }
        } else {
            match self {
                FetchError::JsonError(_) => "Invalid JSON response",
                FetchError::UnexpectedPayload(_) => "Unexpected response shape",
                FetchError::ApiError { .. } => "Client error",
                _ => "Non-transient error",
            }
        }
    }
}

/// Why an operation produced no data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retries were exhausted on 429/5xx/transport failures
    Transient,
    /// Upstream rejected the request with a non-retryable status
    Upstream(u16),
    /// The payload could not be decoded or failed validation
    Payload,
}

impl From<&FetchError> for FailureKind {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::ApiError { status, .. } if !err.is_retryable() => {
                FailureKind::Upstream(*status)
            }
            FetchError::JsonError(_) | FetchError::UnexpectedPayload(_) => FailureKind::Payload,
            _ => FailureKind::Transient,
        }
    }
}

impl From<&ParseError> for FailureKind {
    fn from(_: &ParseError) -> Self {
        FailureKind::Payload
    }
}

/// Result of a gateway operation that distinguishes absence from failure
///
/// The plain gateway methods collapse this into an empty value; the
/// `try_*` variants hand it to callers that want to tell the cases apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Upstream answered and the value is non-empty
    Found(T),
    /// Upstream answered, but there was nothing to return
    Empty,
    /// No data because something went wrong
    Failed(FailureKind),
}

impl<T> Outcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Convert into an `Option`, dropping the distinction between empty and failed
    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(value) => Some(value),
            Outcome::Empty | Outcome::Failed(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Found(value) => Outcome::Found(f(value)),
            Outcome::Empty => Outcome::Empty,
            Outcome::Failed(kind) => Outcome::Failed(kind),
        }
    }
}

impl<T: Default> Outcome<T> {
    /// The found value, or the type's empty value
    pub fn unwrap_or_empty(self) -> T {
        self.found().unwrap_or_default()
    }
}

impl<T> Outcome<Vec<T>> {
    /// `Found` for a non-empty list, `Empty` otherwise
    pub fn from_list(items: Vec<T>) -> Self {
        if items.is_empty() {
            Outcome::Empty
        } else {
            Outcome::Found(items)
        }
    }
}
