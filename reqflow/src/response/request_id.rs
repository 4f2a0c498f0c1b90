//! Records the peer's request id.

use super::after;
use crate::core::{Key, Metadata};
use crate::pipeline::{DeserializeFn, Interceptor};
use crate::request::X_REQUEST_ID;
use http::header::HeaderName;
use std::sync::Arc;

/// Metadata key for the request id.
#[derive(Debug)]
pub struct RequestIdKey;

impl Key for RequestIdKey {
    type Value = String;
}

/// Returns the request id recorded by [`RequestIdDeserializer`].
#[must_use]
pub fn request_id(md: &Metadata) -> Option<&str> {
    md.get::<RequestIdKey>().map(String::as_str)
}

/// Stores the first non-empty value among `headers` in metadata.
#[derive(Debug, Clone)]
pub struct RequestIdDeserializer {
    headers: Arc<[HeaderName]>,
}

impl Default for RequestIdDeserializer {
    fn default() -> Self {
        Self {
            headers: Arc::new([X_REQUEST_ID]),
        }
    }
}

impl RequestIdDeserializer {
    /// Reads `X-Request-Id`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the given headers in order. An empty list keeps the default.
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = HeaderName>) -> Self {
        let headers: Vec<HeaderName> = headers.into_iter().collect();
        if !headers.is_empty() {
            self.headers = headers.into();
        }
        self
    }
}

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for RequestIdDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        let headers = self.headers.clone();
        after(next, move |outcome| {
            let Some(response) = &outcome.output.response else {
                return;
            };
            if let Some(id) = headers.iter().find_map(|h| response.header_str(h)) {
                outcome.metadata.set::<RequestIdKey>(id.to_string());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::stub::{respond, run};
    use super::*;
    use crate::core::WireResponse;
    use http::header::HeaderValue;
    use http::StatusCode;

    fn with_ids(pairs: &[(&'static str, &'static str)]) -> WireResponse {
        pairs.iter().fold(WireResponse::new(StatusCode::OK), |resp, &(name, value)| {
            resp.with_header(HeaderName::from_static(name), HeaderValue::from_static(value))
        })
    }

    #[tokio::test]
    async fn test_default_header() {
        let resp = with_ids(&[("x-request-id", "12ca095b")]);
        let outcome = run(RequestIdDeserializer::new().wrap(respond(Some(resp), None))).await;

        assert_eq!(request_id(&outcome.metadata), Some("12ca095b"));
    }

    #[tokio::test]
    async fn test_first_non_empty_header_wins() {
        let resp = with_ids(&[("x-amz-request-id", ""), ("x-acs-request-id", "acs-1")]);
        let deserializer = RequestIdDeserializer::new().with_headers([
            HeaderName::from_static("x-amz-request-id"),
            HeaderName::from_static("x-acs-request-id"),
        ]);
        let outcome = run(deserializer.wrap(respond(Some(resp), Some("boom")))).await;

        assert_eq!(request_id(&outcome.metadata), Some("acs-1"));
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_no_response_records_nothing() {
        let outcome = run(RequestIdDeserializer::new().wrap(respond(None, Some("refused")))).await;
        assert!(request_id(&outcome.metadata).is_none());
    }
}
