//! Keeps the raw response in metadata.

use super::after;
use crate::core::{Key, Metadata, WireResponse};
use crate::pipeline::{DeserializeFn, Interceptor};

/// Metadata key for the raw response.
#[derive(Debug)]
pub struct ResponseKey;

impl Key for ResponseKey {
    type Value = WireResponse;
}

/// Returns the response recorded by [`ResponseDeserializer`].
#[must_use]
pub fn response(md: &Metadata) -> Option<&WireResponse> {
    md.get::<ResponseKey>()
}

/// Records the raw response so outer stages can inspect status and headers.
///
/// The recorded response shares its body with the one the call returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDeserializer;

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for ResponseDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        after(next, |outcome| {
            if let Some(response) = &outcome.output.response {
                outcome.metadata.set::<ResponseKey>(response.clone());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::stub::{respond, run};
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn test_records_response() {
        let resp = WireResponse::new(StatusCode::ACCEPTED).with_body("queued");
        let outcome = run(ResponseDeserializer.wrap(respond(Some(resp), Some("bad")))).await;

        let recorded = response(&outcome.metadata).unwrap();
        assert_eq!(recorded.status, StatusCode::ACCEPTED);
        assert_eq!(&recorded.body.read_all().unwrap()[..], b"queued");
    }

    #[tokio::test]
    async fn test_no_response_records_nothing() {
        let outcome = run(ResponseDeserializer.wrap(respond(None, Some("refused")))).await;
        assert!(response(&outcome.metadata).is_none());
    }
}
