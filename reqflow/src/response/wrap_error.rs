//! Classifies errors by whether a response arrived.

use super::after;
use super::request_id::request_id;
use crate::errors::{Error, RequestSendError, ResponseError};
use crate::pipeline::{DeserializeFn, Interceptor};

/// Wraps an error with no response in a [`RequestSendError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapRequestErrorDeserializer;

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for WrapRequestErrorDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        after(next, |outcome| {
            if outcome.output.response.is_some() {
                return;
            }
            outcome.error = outcome.error.take().map(|err| match err {
                Error::RequestSend(_) => err,
                err => RequestSendError::new(err).into(),
            });
        })
    }
}

/// Wraps an error accompanied by a response in a [`ResponseError`].
///
/// The request id already recorded in metadata, if any, is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapResponseErrorDeserializer;

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for WrapResponseErrorDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        after(next, |outcome| {
            let Some(response) = &outcome.output.response else {
                return;
            };
            let request_id = request_id(&outcome.metadata).map(str::to_owned);
            outcome.error = outcome.error.take().map(|err| match err {
                Error::Response(_) => err,
                err => ResponseError::new(response.clone(), err)
                    .with_request_id(request_id)
                    .into(),
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::stub::{respond, run};
    use super::*;
    use crate::core::WireResponse;
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn unavailable() -> WireResponse {
        WireResponse::new(StatusCode::SERVICE_UNAVAILABLE)
    }

    #[tokio::test]
    async fn test_request_error_without_response() {
        let outcome = run(WrapRequestErrorDeserializer.wrap(respond(None, Some("dial tcp")))).await;
        let err = outcome.error.unwrap();

        assert!(matches!(err, Error::RequestSend(_)));
        assert_eq!(err.to_string(), "request send failed, dial tcp");
    }

    #[tokio::test]
    async fn test_request_error_ignores_responses_and_success() {
        let with_response =
            run(WrapRequestErrorDeserializer.wrap(respond(Some(unavailable()), Some("bad")))).await;
        assert!(matches!(with_response.error, Some(Error::Other(_))));

        let ok = run(WrapRequestErrorDeserializer.wrap(respond(None, None))).await;
        assert!(ok.error.is_none());
    }

    #[tokio::test]
    async fn test_response_error_with_response() {
        let outcome =
            run(WrapResponseErrorDeserializer.wrap(respond(Some(unavailable()), Some("bad")))).await;
        let err = outcome.error.unwrap();

        assert_eq!(err.response_error().map(ResponseError::status_code), Some(503));
        assert_eq!(err.to_string(), "http response error, status code: 503, bad");
    }

    #[tokio::test]
    async fn test_wrappers_are_idempotent() {
        let twice = WrapResponseErrorDeserializer
            .wrap(WrapResponseErrorDeserializer.wrap(respond(Some(unavailable()), Some("bad"))));
        let err = run(twice).await.error.unwrap();
        let Error::Response(outer) = &err else {
            panic!("expected a response error, got {err:?}");
        };
        assert!(!matches!(outer.source.as_ref(), Error::Response(_)));

        let layers: Vec<Arc<dyn Interceptor<DeserializeFn<()>>>> = vec![
            Arc::new(WrapRequestErrorDeserializer),
            Arc::new(WrapRequestErrorDeserializer),
        ];
        let handler = crate::pipeline::compose(layers).wrap(respond(None, Some("refused")));
        assert_eq!(
            run(handler).await.error.unwrap().to_string(),
            "request send failed, refused"
        );
    }
}
