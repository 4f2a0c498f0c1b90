//! Raw response envelope returned by a transport.

use super::body::WireBody;
use super::request::header_str;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

/// A response received from a peer.
///
/// Cloning shares the body handle, so a response stored in metadata or inside
/// a [`ResponseError`](crate::errors::ResponseError) refers to the same body.
#[derive(Debug, Clone)]
pub struct WireResponse {
    /// Status line code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Declared body length. `None` when unknown.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: WireBody,
}

impl WireResponse {
    /// Creates a response with no headers and an empty body.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content_length: Some(0),
            body: WireBody::closed(),
        }
    }

    /// Sets an in-memory body and its length.
    #[must_use]
    pub fn with_body(mut self, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        self.content_length = Some(bytes.len() as u64);
        self.body = WireBody::from_bytes(bytes);
        self
    }

    /// Sets a streamed body of unknown length.
    #[must_use]
    pub fn with_stream(mut self, body: WireBody) -> Self {
        self.content_length = None;
        self.body = body;
        self
    }

    /// Sets a header, replacing previous values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a header value as text, if present and non-empty.
    #[must_use]
    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
