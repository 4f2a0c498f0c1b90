//! Error types for reqflow.
//!
//! Every failure a pipeline call reports is an [`Error`]. Its variants record
//! how far the call got: validation and serialization failures never left the
//! client, [`RequestSendError`] means no response came back, and
//! [`ResponseError`] means a response arrived but could not be turned into a
//! result. Wrappers keep their cause, so the whole chain prints as one line
//! and every layer stays reachable through [`Error::cause`] and
//! [`std::error::Error::source`].

mod api;
mod kinds;
mod probe;

pub use api::{ApiError, ErrorFault, GenericApiError};
pub use kinds::{
    DeserializationError, OperationError, RequestSendError, ResponseError, RetryError,
    RetryReason, SerializationError,
};
pub use probe::{AsProbe, BoxError, ErrorProbe, Opaque};

use crate::context::CancelCause;
use crate::validation::{InvalidParamError, InvalidParamsError};
use std::error::Error as StdError;

/// Errors that can occur during a pipeline call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The call identity wrapper.
    #[error(transparent)]
    Operation(#[from] OperationError),
    /// Input serialization failed.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    /// Several input parameters were invalid.
    #[error(transparent)]
    InvalidParams(#[from] InvalidParamsError),
    /// One input parameter was invalid.
    #[error(transparent)]
    InvalidParam(#[from] InvalidParamError),
    /// The transport produced no response.
    #[error(transparent)]
    RequestSend(#[from] RequestSendError),
    /// A response arrived but processing it failed.
    #[error(transparent)]
    Response(#[from] ResponseError),
    /// Decoding the response failed.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
    /// The peer declared an application error.
    #[error(transparent)]
    Api(Box<dyn ApiError>),
    /// The retry engine gave up.
    #[error(transparent)]
    Retry(#[from] RetryError),
    /// The call context finished.
    #[error(transparent)]
    Canceled(#[from] CancelCause),
    /// Any other error.
    #[error(transparent)]
    Other(Box<dyn ErrorProbe>),
}

impl Error {
    /// Wraps a plain error.
    ///
    /// An [`Error`] or [`CancelCause`] that was boxed on its way through a
    /// collaborator is recovered as-is rather than wrapped again.
    pub fn other(err: impl Into<BoxError>) -> Self {
        let err = err.into();
        let err = match err.downcast::<Self>() {
            Ok(err) => return *err,
            Err(err) => err,
        };
        match err.downcast::<CancelCause>() {
            Ok(cause) => Self::Canceled(*cause),
            Err(err) => Self::Other(Box::new(Opaque::new(err))),
        }
    }

    /// Wraps an error that implements its own probes.
    pub fn probed(err: impl ErrorProbe) -> Self {
        Self::Other(Box::new(err))
    }

    /// Wraps an API error.
    pub fn api(err: impl ApiError) -> Self {
        Self::Api(Box::new(err))
    }

    /// Returns the error this one wraps, if it is a wrapper.
    #[must_use]
    pub fn cause(&self) -> Option<&Self> {
        match self {
            Self::Operation(e) => Some(e.source.as_ref()),
            Self::Serialization(e) => Some(e.source.as_ref()),
            Self::RequestSend(e) => Some(e.source.as_ref()),
            Self::Response(e) => Some(e.source.as_ref()),
            Self::Deserialization(e) => Some(e.source.as_ref()),
            Self::Retry(e) => Some(e.source.as_ref()),
            Self::InvalidParams(_)
            | Self::InvalidParam(_)
            | Self::Api(_)
            | Self::Canceled(_)
            | Self::Other(_) => None,
        }
    }

    /// Iterates over this error and every error it wraps, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |e| Error::cause(e))
    }

    /// Returns this layer's probes.
    #[must_use]
    pub fn as_probe(&self) -> &dyn ErrorProbe {
        match self {
            Self::Operation(e) => e,
            Self::Serialization(e) => e,
            Self::InvalidParams(e) => e,
            Self::InvalidParam(e) => e,
            Self::RequestSend(e) => e,
            Self::Response(e) => e,
            Self::Deserialization(e) => e,
            Self::Api(e) => e.as_probe(),
            Self::Retry(e) => e,
            Self::Canceled(e) => e,
            Self::Other(e) => e.as_probe(),
        }
    }

    /// Asks each layer in turn, outermost first, and returns the first answer.
    pub fn probe<T>(&self, f: impl Fn(&dyn ErrorProbe) -> Option<T>) -> Option<T> {
        self.chain().find_map(|e| f(e.as_probe()))
    }

    /// Finds the first error of type `T` anywhere in the source chain.
    #[must_use]
    pub fn find<T: StdError + 'static>(&self) -> Option<&T> {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<T>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }

    /// Returns the first [`ResponseError`] in the chain.
    #[must_use]
    pub fn response_error(&self) -> Option<&ResponseError> {
        self.chain().find_map(|e| match e {
            Self::Response(r) => Some(r),
            _ => None,
        })
    }

    /// Returns the first API error in the chain.
    #[must_use]
    pub fn api_error(&self) -> Option<&dyn ApiError> {
        self.chain().find_map(|e| match e {
            Self::Api(api) => Some(api.as_ref()),
            _ => None,
        })
    }

    /// Returns true if the call ended because its context finished.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.chain().any(|e| matches!(e, Self::Canceled(_)))
    }
}

/// Cancellation overrides no capability, so the default checkers classify it as
/// `Unknown` and a call whose context finished is never retried. Retrying
/// would only race the same finished context again.
impl ErrorProbe for CancelCause {}

impl From<GenericApiError> for Error {
    fn from(e: GenericApiError) -> Self {
        Self::Api(Box::new(e))
    }
}

impl From<BoxError> for Error {
    fn from(e: BoxError) -> Self {
        Self::other(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::other(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WireResponse;
    use http::StatusCode;
    use std::io;

    #[derive(Debug, thiserror::Error)]
    #[error("throttled")]
    struct Throttled;

    impl ErrorProbe for Throttled {
        fn retryable_error(&self) -> Option<bool> {
            Some(true)
        }
    }

    #[test]
    fn test_other_recovers_boxed_error() {
        let boxed: BoxError = Box::new(Error::from(CancelCause::Canceled));
        let err = Error::other(boxed);
        assert!(matches!(err, Error::Canceled(CancelCause::Canceled)));

        let boxed: BoxError = Box::new(CancelCause::DeadlineExceeded);
        assert!(Error::other(boxed).is_canceled());
    }

    #[test]
    fn test_cause_chain_outermost_first() {
        let err: Error = OperationError::new(
            "svc",
            "Op",
            RequestSendError::new(Error::other("dial tcp: refused")).into(),
        )
        .into();

        let layers: Vec<String> = err.chain().map(ToString::to_string).collect();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[2], "dial tcp: refused");
        assert_eq!(
            layers[0],
            "svc operation error: Op, request send failed, dial tcp: refused"
        );
    }

    #[test]
    fn test_probe_reaches_inner_layers() {
        let err: Error = RetryError::new(
            1,
            RetryReason::NotRetryable(crate::retry::Retryable::No),
            ResponseError::new(WireResponse::new(StatusCode::SERVICE_UNAVAILABLE), Error::probed(Throttled)),
        )
        .into();

        assert_eq!(err.probe(|p| p.http_status_code()), Some(503));
        assert_eq!(err.probe(|p| p.retryable_error()), Some(true));
        assert_eq!(err.probe(|p| p.error_code().map(str::to_owned)), None);
    }

    #[test]
    fn test_chain_walks_nested_wrappers() {
        let err: Error = OperationError::new(
            "svc",
            "Op",
            RetryError::new(
                2,
                RetryReason::Exhausted { max_attempts: 2 },
                RequestSendError::new(CancelCause::DeadlineExceeded),
            )
            .into(),
        )
        .into();

        assert_eq!(err.chain().count(), 4);
        assert!(matches!(err.chain().last(), Some(Error::Canceled(CancelCause::DeadlineExceeded))));
        assert!(err.is_canceled());
    }

    #[test]
    fn test_source_chain_matches_display() {
        let err: Error = RequestSendError::new(io::Error::new(io::ErrorKind::TimedOut, "i/o timeout")).into();
        assert_eq!(err.to_string(), "request send failed, i/o timeout");

        let source = StdError::source(&err).unwrap();
        assert_eq!(source.to_string(), "i/o timeout");
        let inner = StdError::source(source).unwrap();
        assert_eq!(
            inner.downcast_ref::<io::Error>().map(io::Error::kind),
            Some(io::ErrorKind::TimedOut)
        );

        let api = Error::api(GenericApiError::new("Gone", "deleted"));
        assert_eq!(api.to_string(), "api error: Gone, deleted");
        assert!(StdError::source(&api).unwrap().downcast_ref::<GenericApiError>().is_some());
    }

    #[test]
    fn test_find_downcasts_foreign_error() {
        let err: Error = RequestSendError::new(io::Error::from(io::ErrorKind::ConnectionRefused)).into();
        let io = err.find::<io::Error>().unwrap();
        assert_eq!(io.kind(), io::ErrorKind::ConnectionRefused);
        assert!(err.find::<Throttled>().is_none());
    }

    #[test]
    fn test_api_error_accessor() {
        let err: Error = ResponseError::new(
            WireResponse::new(StatusCode::CONFLICT),
            GenericApiError::new("Conflict", "version mismatch"),
        )
        .into();

        let api = err.api_error().unwrap();
        assert_eq!(api.code(), "Conflict");
        assert_eq!(err.response_error().unwrap().status_code(), 409);
        assert!(!err.is_canceled());
    }
}
