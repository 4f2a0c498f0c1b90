//! Minimal serializer and deserializer stages for test pipelines.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;

use crate::context::Context;
use crate::core::{Body, Request, WireRequest};
use crate::errors::{Error, ErrorFault, GenericApiError};
use crate::pipeline::{
    DeserializeFn, DeserializeOutput, Interceptor, SerializeFn, SerializeInput, StageFuture,
};

/// Serializes any input into a fixed request.
///
/// The body, when set, is a fresh seekable copy for every call.
#[derive(Debug, Clone)]
pub struct FixedRequestSerializer {
    method: Method,
    url: String,
    body: Option<Bytes>,
}

impl FixedRequestSerializer {
    /// Creates a serializer for `method url`.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    /// Sends `body` with every request.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl<I, O> Interceptor<SerializeFn<I, O>> for FixedRequestSerializer
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn wrap(&self, next: SerializeFn<I, O>) -> SerializeFn<I, O> {
        let this = self.clone();
        Arc::new(move |ctx: Context, input: SerializeInput<I>| -> StageFuture<Option<O>> {
            let mut request = Request::new(this.method.clone(), this.url.clone());
            if let Some(body) = &this.body {
                request = request.with_body(Body::from_bytes(body.clone()));
            }
            next(ctx, input.with_request(request))
        })
    }
}

/// Decodes the response status as the call output.
///
/// Non-2xx responses become a [`GenericApiError`] whose code is the status
/// and whose message is the response body. 5xx responses are server faults.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusDeserializer;

impl Interceptor<DeserializeFn<u16>> for StatusDeserializer {
    fn wrap(&self, next: DeserializeFn<u16>) -> DeserializeFn<u16> {
        Arc::new(move |ctx: Context, request: WireRequest| -> StageFuture<DeserializeOutput<u16>> {
            let inner = next(ctx, request);
            Box::pin(async move {
                let mut outcome = inner.await;
                if outcome.is_err() {
                    return outcome;
                }
                let Some(response) = &outcome.output.response else {
                    return outcome;
                };
                let status = response.status;
                if status.is_success() {
                    outcome.output.output = Some(status.as_u16());
                    return outcome;
                }
                let message = match response.body.read_all() {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(err) => {
                        outcome.error = Some(err.into());
                        return outcome;
                    }
                };
                let fault = if status.is_server_error() {
                    ErrorFault::Server
                } else {
                    ErrorFault::Client
                };
                outcome.error = Some(Error::api(
                    GenericApiError::new(status.as_str(), message).with_fault(fault),
                ));
                outcome
            })
        })
    }
}
