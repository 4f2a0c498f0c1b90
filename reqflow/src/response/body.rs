//! Response body cleanup.

use super::after;
use crate::core::WireResponse;
use crate::pipeline::{DeserializeFn, Interceptor};
use std::io::{self, Read};
use tracing::debug;

/// Most bytes a discard deserializer reads from a response body.
pub const MAX_BODY_DISCARD_BYTES: u64 = 2 << 10;

fn close(response: Option<&WireResponse>) {
    if let Some(response) = response {
        response.body.close();
    }
}

// Only bodies of unknown or small length are drained.
fn discard(response: Option<&WireResponse>) {
    let Some(response) = response else {
        return;
    };
    if response
        .content_length
        .is_some_and(|len| len > MAX_BODY_DISCARD_BYTES)
    {
        return;
    }
    let mut body = response.body.clone().take(MAX_BODY_DISCARD_BYTES);
    if let Err(err) = io::copy(&mut body, &mut io::sink()) {
        debug!(error = %err, "Discarding response body failed");
    }
}

/// Closes the response body when the inner chain succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyCloseDeserializer;

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for BodyCloseDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        after(next, |outcome| {
            if outcome.is_ok() {
                close(outcome.output.response.as_ref());
            }
        })
    }
}

/// Closes the response body when the inner chain fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyCloseErrorDeserializer;

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for BodyCloseErrorDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        after(next, |outcome| {
            if outcome.is_err() {
                close(outcome.output.response.as_ref());
            }
        })
    }
}

/// Drains the response body when the inner chain succeeds, so the
/// connection can be reused.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyDiscardDeserializer;

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for BodyDiscardDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        after(next, |outcome| {
            if outcome.is_ok() {
                discard(outcome.output.response.as_ref());
            }
        })
    }
}

/// Drains the response body when the inner chain fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyDiscardErrorDeserializer;

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for BodyDiscardErrorDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        after(next, |outcome| {
            if outcome.is_err() {
                discard(outcome.output.response.as_ref());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::stub::{respond, run};
    use super::*;
    use crate::core::WireBody;
    use bytes::Bytes;
    use http::StatusCode;

    fn small() -> WireResponse {
        WireResponse::new(StatusCode::OK).with_body("payload")
    }

    fn large() -> WireResponse {
        WireResponse::new(StatusCode::OK).with_body(vec![b'x'; 4096])
    }

    fn unread(response: &WireResponse) -> Bytes {
        response.body.read_all().unwrap()
    }

    #[tokio::test]
    async fn test_close_on_success_only() {
        let resp = small();
        run(BodyCloseDeserializer.wrap(respond(Some(resp.clone()), Some("bad")))).await;
        assert!(!resp.body.is_closed());

        run(BodyCloseDeserializer.wrap(respond(Some(resp.clone()), None))).await;
        assert!(resp.body.is_closed());
    }

    #[tokio::test]
    async fn test_close_on_error_only() {
        let resp = small();
        run(BodyCloseErrorDeserializer.wrap(respond(Some(resp.clone()), None))).await;
        assert!(!resp.body.is_closed());

        run(BodyCloseErrorDeserializer.wrap(respond(Some(resp.clone()), Some("bad")))).await;
        assert!(resp.body.is_closed());
    }

    #[tokio::test]
    async fn test_discard_on_success_only() {
        let kept = small();
        run(BodyDiscardDeserializer.wrap(respond(Some(kept.clone()), Some("bad")))).await;
        assert_eq!(&unread(&kept)[..], b"payload");

        let drained = small();
        run(BodyDiscardDeserializer.wrap(respond(Some(drained.clone()), None))).await;
        assert!(unread(&drained).is_empty());
    }

    #[tokio::test]
    async fn test_discard_on_error_only() {
        let drained = small();
        run(BodyDiscardErrorDeserializer.wrap(respond(Some(drained.clone()), Some("bad")))).await;
        assert!(unread(&drained).is_empty());
    }

    #[tokio::test]
    async fn test_discard_skips_large_known_length() {
        let resp = large();
        run(BodyDiscardDeserializer.wrap(respond(Some(resp.clone()), None))).await;
        assert_eq!(unread(&resp).len(), 4096);
    }

    #[tokio::test]
    async fn test_discard_unknown_length_reads_at_most_limit() {
        let resp = WireResponse::new(StatusCode::OK).with_stream(WireBody::from_bytes(vec![b'x'; 4096]));
        run(BodyDiscardDeserializer.wrap(respond(Some(resp.clone()), None))).await;
        assert_eq!(unread(&resp).len(), 4096 - 2048);
    }
}
