//! Mock transports for testing.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::HeaderMap;
use http::{Method, StatusCode};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::context::Context;
use crate::core::{WireRequest, WireResponse};
use crate::errors::BoxError;
use crate::pipeline::Transport;

/// A request as the transport received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method.
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Declared content length.
    pub content_length: Option<u64>,
    /// Every body byte the transport read.
    pub body: Bytes,
}

enum Step {
    Respond(WireResponse),
    Fail(BoxError),
}

/// A transport that replays a script of responses and errors.
///
/// Each call consumes the next step. Once the script runs out every call
/// gets `200 OK` with an empty body. The request body is read in full and
/// recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("remaining", &self.script.lock().len())
            .field("calls", &self.calls())
            .finish()
    }
}

impl ScriptedTransport {
    /// Creates a transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response.
    #[must_use]
    pub fn with_response(self, response: WireResponse) -> Self {
        self.script.lock().push_back(Step::Respond(response));
        self
    }

    /// Appends a response with the given status and no body.
    #[must_use]
    pub fn with_status(self, status: StatusCode) -> Self {
        self.with_response(WireResponse::new(status))
    }

    /// Appends a send failure.
    #[must_use]
    pub fn with_error(self, err: impl Into<BoxError>) -> Self {
        self.script.lock().push_back(Step::Fail(err.into()));
        self
    }

    /// Appends an I/O failure of the given kind.
    #[must_use]
    pub fn with_io_error(self, kind: io::ErrorKind, message: &str) -> Self {
        self.with_error(io::Error::new(kind, message.to_string()))
    }

    /// Returns the number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _ctx: &Context, request: WireRequest) -> Result<WireResponse, BoxError> {
        let body = match &request.body {
            Some(body) => body.read_all()?,
            None => Bytes::new(),
        };
        self.requests.lock().push(RecordedRequest {
            method: request.method,
            url: request.url,
            headers: request.headers,
            content_length: request.content_length,
            body,
        });

        match self.script.lock().pop_front() {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(err)) => Err(err),
            None => Ok(WireResponse::new(StatusCode::OK)),
        }
    }
}

/// A transport that always fails with the same message.
#[derive(Debug, Clone)]
pub struct FailingTransport {
    message: String,
}

impl FailingTransport {
    /// Creates a transport failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, _ctx: &Context, _request: WireRequest) -> Result<WireResponse, BoxError> {
        Err(self.message.clone().into())
    }
}

/// A transport that waits before answering `200 OK`.
///
/// Gives up with the context's cancel cause if the context finishes first.
#[derive(Debug, Clone)]
pub struct SlowTransport {
    delay: Duration,
}

impl SlowTransport {
    /// Creates a transport that waits `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a transport that waits `ms` milliseconds.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Transport for SlowTransport {
    async fn send(&self, ctx: &Context, _request: WireRequest) -> Result<WireResponse, BoxError> {
        tokio::select! {
            cause = ctx.done() => Err(cause.into()),
            () = tokio::time::sleep(self.delay) => Ok(WireResponse::new(StatusCode::OK)),
        }
    }
}
