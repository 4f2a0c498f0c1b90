//! Response-side collaborators.
//!
//! Every type here is a Deserialize-stage interceptor that acts after the
//! inner chain returns:
//! - Error classification by whether a response arrived
//! - Response facts recorded in metadata (request id, date, raw response)
//! - Response body cleanup on the success or error path

mod body;
mod date;
mod raw;
mod request_id;
mod wrap_error;

pub use body::{
    BodyCloseDeserializer, BodyCloseErrorDeserializer, BodyDiscardDeserializer,
    BodyDiscardErrorDeserializer, MAX_BODY_DISCARD_BYTES,
};
pub use date::{date, parse_http_date, DateDeserializer, DateKey};
pub use raw::{response, ResponseDeserializer, ResponseKey};
pub use request_id::{request_id, RequestIdDeserializer, RequestIdKey};
pub use wrap_error::{WrapRequestErrorDeserializer, WrapResponseErrorDeserializer};

use crate::context::Context;
use crate::core::{Outcome, WireRequest};
use crate::pipeline::{DeserializeFn, DeserializeOutput, StageFuture};
use std::sync::Arc;

/// Runs `hook` on the outcome of `next` before handing it back.
fn after<O, H>(next: DeserializeFn<O>, hook: H) -> DeserializeFn<O>
where
    O: Send + 'static,
    H: Fn(&mut Outcome<DeserializeOutput<O>>) + Send + Sync + 'static,
{
    let hook = Arc::new(hook);
    Arc::new(move |ctx: Context, request: WireRequest| -> StageFuture<DeserializeOutput<O>> {
        let inner = next(ctx, request);
        let hook = hook.clone();
        Box::pin(async move {
            let mut outcome = inner.await;
            hook(&mut outcome);
            outcome
        })
    })
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use crate::core::{Metadata, Request, WireResponse};
    use crate::errors::Error;
    use crate::pipeline::deserialize_fn;
    use http::Method;

    /// An inner deserialize function returning a fixed response and error.
    pub(crate) fn respond(
        response: Option<WireResponse>,
        error: Option<&'static str>,
    ) -> DeserializeFn<()> {
        deserialize_fn(move |_ctx: Context, _req: WireRequest| {
            let response = response.clone();
            async move {
                Outcome {
                    output: DeserializeOutput {
                        output: None,
                        response,
                    },
                    metadata: Metadata::new(),
                    error: error.map(Error::other),
                }
            }
        })
    }

    pub(crate) async fn run(handler: DeserializeFn<()>) -> Outcome<DeserializeOutput<()>> {
        let wire = Request::new(Method::GET, "http://example.com/").build();
        handler(Context::background(), wire).await
    }
}
