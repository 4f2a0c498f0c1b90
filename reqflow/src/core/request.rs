//! Logical and on-the-wire request envelopes.

use super::body::{Body, WireBody};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;

/// The logical request assembled by the serialize stage.
///
/// The body is a shared [`Body`] handle that this request never closes or
/// drains. Cloning copies method, URL, headers and length, and shares the
/// body handle.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Declared body length. `None` when unknown.
    pub content_length: Option<u64>,
    /// Body reference.
    pub body: Body,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            content_length: None,
            body: Body::empty(),
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a header, replacing previous values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the declared body length.
    #[must_use]
    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    /// Returns a header value as text, if present and non-empty.
    #[must_use]
    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Produces the request handed to the deserialize stage.
    ///
    /// The wire request gets a fresh [`WireBody`] around the shared body, or
    /// no body at all (and a zero length) when the body is empty.
    #[must_use]
    pub fn build(&self) -> WireRequest {
        let (body, content_length) = if self.body.is_empty() {
            (None, Some(0))
        } else {
            (Some(WireBody::new(self.body.clone())), self.content_length)
        };
        WireRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            content_length,
            body,
        }
    }
}

/// A request ready to be sent by a transport.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP method.
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Declared body length. `None` when unknown.
    pub content_length: Option<u64>,
    /// Body for this attempt, absent when the request has no body.
    pub body: Option<WireBody>,
}

impl WireRequest {
    /// Returns a header value as text, if present and non-empty.
    #[must_use]
    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Closes the body, if any.
    pub fn close_body(&self) {
        if let Some(body) = &self.body {
            body.close();
        }
    }
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
