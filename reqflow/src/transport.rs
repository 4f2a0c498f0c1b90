//! Transport implementations.
//!
//! [`FnTransport`] adapts an async closure. With the `reqwest` feature,
//! [`ReqwestTransport`] sends requests through a `reqwest::Client`.

use crate::context::Context;
use crate::core::{WireRequest, WireResponse};
use crate::errors::BoxError;
use crate::pipeline::Transport;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// A transport backed by an async closure.
pub struct FnTransport<F> {
    send: F,
}

impl<F, Fut> FnTransport<F>
where
    F: Fn(Context, WireRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<WireResponse, BoxError>> + Send,
{
    /// Wraps `send`.
    pub fn new(send: F) -> Self {
        Self { send }
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(Context, WireRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<WireResponse, BoxError>> + Send,
{
    async fn send(&self, ctx: &Context, request: WireRequest) -> Result<WireResponse, BoxError> {
        (self.send)(ctx.clone(), request).await
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::*;
    use bytes::Bytes;

    /// Sends requests with a [`reqwest::Client`].
    ///
    /// The request body is read into memory before sending, and the whole
    /// response body is read before returning. The call context can cut
    /// either phase short.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Uses a default client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Uses the given client.
        #[must_use]
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }

        async fn exchange(&self, request: WireRequest) -> Result<WireResponse, BoxError> {
            let body = match &request.body {
                Some(body) => body.read_all()?,
                None => Bytes::new(),
            };
            let mut builder = self
                .client
                .request(request.method, request.url)
                .headers(request.headers);
            if !body.is_empty() {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;

            let mut wire = WireResponse::new(status).with_body(bytes);
            wire.headers = headers;
            Ok(wire)
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, ctx: &Context, request: WireRequest) -> Result<WireResponse, BoxError> {
            tokio::select! {
                cause = ctx.done() => Err(cause.into()),
                result = self.exchange(request) => result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Request;
    use http::header::{HeaderValue, CONTENT_TYPE};
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn test_fn_transport_echoes() {
        let transport = FnTransport::new(|_ctx: Context, request: WireRequest| async move {
            let body = match &request.body {
                Some(body) => body.read_all()?,
                None => bytes::Bytes::new(),
            };
            Ok::<_, BoxError>(
                WireResponse::new(StatusCode::OK)
                    .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
                    .with_body(body),
            )
        });

        let wire = Request::new(Method::POST, "http://example.com/")
            .with_body("ping")
            .build();
        let response = transport.send(&Context::background(), wire).await.unwrap();

        assert_eq!(response.header_str(&CONTENT_TYPE), Some("text/plain"));
        assert_eq!(&response.body.read_all().unwrap()[..], b"ping");
    }
}
