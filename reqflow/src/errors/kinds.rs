//! Wrapper kinds that record where in the call an error happened.

use super::probe::ErrorProbe;
use super::Error;
use crate::core::WireResponse;
use crate::retry::Retryable;
use bytes::Bytes;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// The outermost wrapper once the service and operation are known.
#[derive(Debug, Error)]
#[error("{service} operation error: {operation}, {source}")]
pub struct OperationError {
    /// Service name. May be empty.
    pub service: String,
    /// Operation name. May be empty.
    pub operation: String,
    /// The wrapped error.
    pub source: Box<Error>,
}

impl OperationError {
    /// Wraps `source` with the call identity.
    pub fn new(service: impl Into<String>, operation: impl Into<String>, source: Error) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            source: Box::new(source),
        }
    }
}

impl ErrorProbe for OperationError {}

/// Turning the typed input into a request failed.
#[derive(Debug, Error)]
#[error("request serialization failed, {source}")]
pub struct SerializationError {
    /// The wrapped error.
    pub source: Box<Error>,
}

impl SerializationError {
    /// Wraps `source`.
    pub fn new(source: impl Into<Error>) -> Self {
        Self {
            source: Box::new(source.into()),
        }
    }
}

impl ErrorProbe for SerializationError {}

/// The transport produced no response.
#[derive(Debug, Error)]
#[error("request send failed, {source}")]
pub struct RequestSendError {
    /// The wrapped error.
    pub source: Box<Error>,
}

impl RequestSendError {
    /// Wraps `source`.
    pub fn new(source: impl Into<Error>) -> Self {
        Self {
            source: Box::new(source.into()),
        }
    }
}

impl ErrorProbe for RequestSendError {}

/// A response arrived but processing it failed.
///
/// Typical causes are a [`DeserializationError`] or an API error decoded from
/// a non-2xx response.
#[derive(Debug)]
pub struct ResponseError {
    /// The response, sharing its body with every other handle.
    pub response: WireResponse,
    /// Request id reported by the peer, when known.
    pub request_id: Option<String>,
    /// The wrapped error.
    pub source: Box<Error>,
}

impl ResponseError {
    /// Wraps `source` with the response it came with.
    pub fn new(response: WireResponse, source: impl Into<Error>) -> Self {
        Self {
            response,
            request_id: None,
            source: Box::new(source.into()),
        }
    }

    /// Attaches the request id. Empty ids are ignored.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id.filter(|id| !id.is_empty());
        self
    }

    /// Returns the response status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.response.status.as_u16()
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http response error, status code: {}", self.status_code())?;
        if let Some(id) = &self.request_id {
            write!(f, ", request id: {id}")?;
        }
        write!(f, ", {}", self.source)
    }
}

impl StdError for ResponseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

impl ErrorProbe for ResponseError {
    fn http_status_code(&self) -> Option<u16> {
        Some(self.status_code())
    }
}

/// Decoding a response body failed.
#[derive(Debug, Error)]
#[error("deserialization failed, {source}")]
pub struct DeserializationError {
    /// The wrapped error.
    pub source: Box<Error>,
    /// The bytes that failed to decode, when the deserializer kept them.
    pub snapshot: Option<Bytes>,
}

impl DeserializationError {
    /// Wraps `source`.
    pub fn new(source: impl Into<Error>) -> Self {
        Self {
            source: Box::new(source.into()),
            snapshot: None,
        }
    }

    /// Keeps the raw bytes for diagnostics.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: impl Into<Bytes>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }
}

impl ErrorProbe for DeserializationError {}

/// Why the retry engine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The attempt budget ran out.
    Exhausted {
        /// The configured budget.
        max_attempts: u32,
    },
    /// The classifier did not say yes.
    NotRetryable(Retryable),
    /// The context finished during the backoff delay.
    Canceled,
    /// Restoring the body for the next attempt failed.
    RewindFailed,
    /// Capturing the body offset before the first attempt failed.
    RewindInit,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { max_attempts } => write!(f, "max attempts {max_attempts} exhausted"),
            Self::NotRetryable(verdict) => write!(f, "retryable {verdict}"),
            Self::Canceled => write!(f, "sleep canceled"),
            Self::RewindFailed => write!(f, "body rewind failed"),
            Self::RewindInit => write!(f, "new rewind reader failed"),
        }
    }
}

/// The terminal error produced by the retry engine.
#[derive(Debug, Error)]
#[error("request retry finalizer, attempts {attempts}, {reason}, {source}")]
pub struct RetryError {
    /// Attempt count at the point of giving up.
    pub attempts: u32,
    /// Why retrying stopped.
    pub reason: RetryReason,
    /// The last cause.
    pub source: Box<Error>,
}

impl RetryError {
    /// Creates the summary.
    pub fn new(attempts: u32, reason: RetryReason, source: impl Into<Error>) -> Self {
        Self {
            attempts,
            reason,
            source: Box::new(source.into()),
        }
    }
}

impl ErrorProbe for RetryError {}
