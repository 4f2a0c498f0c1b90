//! A unique id per request, sent in a header.

use crate::context::Context;
use crate::core::{Outcome, Request};
use crate::errors::{BoxError, Error, ErrorProbe};
use crate::pipeline::{BuildFn, Interceptor, StageFuture};
use http::header::{HeaderName, HeaderValue};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Header the builder writes unless configured otherwise.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Produces request ids.
pub type IdGenerator = Arc<dyn Fn() -> Result<String, BoxError> + Send + Sync>;

/// Returns 32 lowercase hex characters from a random v4 UUID.
pub fn default_id_generator() -> Result<String, BoxError> {
    Ok(Uuid::new_v4().simple().to_string())
}

/// Generating or encoding the request id failed.
#[derive(Debug, Error)]
#[error("request id builder, {during} failed, {source}")]
pub struct RequestIdError {
    /// The step that failed.
    pub during: &'static str,
    /// The underlying failure.
    pub source: BoxError,
}

impl ErrorProbe for RequestIdError {}

/// Sets a fresh id in a request header unless one is already present.
///
/// An empty generated id leaves the header unset.
#[derive(Clone)]
pub struct RequestIdBuilder {
    header: HeaderName,
    generator: IdGenerator,
}

impl Default for RequestIdBuilder {
    fn default() -> Self {
        Self {
            header: X_REQUEST_ID,
            generator: Arc::new(default_id_generator),
        }
    }
}

impl fmt::Debug for RequestIdBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestIdBuilder")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl RequestIdBuilder {
    /// Creates the builder with the default header and generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the id to another header.
    #[must_use]
    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    /// Replaces the id generator.
    #[must_use]
    pub fn with_generator<G>(mut self, generator: G) -> Self
    where
        G: Fn() -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.generator = Arc::new(generator);
        self
    }

    fn stamp(&self, request: &mut Request) -> Result<(), RequestIdError> {
        if request.header_str(&self.header).is_some() {
            return Ok(());
        }
        let id = (self.generator)().map_err(|source| RequestIdError {
            during: "id generate",
            source,
        })?;
        if id.is_empty() {
            return Ok(());
        }
        let value = HeaderValue::try_from(id).map_err(|err| RequestIdError {
            during: "header encode",
            source: err.into(),
        })?;
        request.headers.insert(self.header.clone(), value);
        Ok(())
    }
}

impl<O: Send + 'static> Interceptor<BuildFn<O>> for RequestIdBuilder {
    fn wrap(&self, next: BuildFn<O>) -> BuildFn<O> {
        let this = self.clone();
        Arc::new(move |ctx: Context, mut request: Request| -> StageFuture<Option<O>> {
            match this.stamp(&mut request) {
                Ok(()) => next(ctx, request),
                Err(err) => Box::pin(async move { Outcome::err(Error::probed(err)) }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::build_fn;
    use http::Method;
    use pretty_assertions::assert_eq;

    fn echo_id(header: HeaderName) -> BuildFn<String> {
        build_fn(move |_ctx: Context, req: Request| {
            let id = req.header_str(&header).unwrap_or("<none>").to_string();
            async move { Outcome::ok(Some(id)) }
        })
    }

    fn get() -> Request {
        Request::new(Method::GET, "http://example.com/")
    }

    #[tokio::test]
    async fn test_generates_hex_id() {
        let build = RequestIdBuilder::new().wrap(echo_id(X_REQUEST_ID));
        let id = build(Context::background(), get()).await.output.unwrap();

        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_existing_header_is_kept() {
        let build = RequestIdBuilder::new().wrap(echo_id(X_REQUEST_ID));
        let request = get().with_header(X_REQUEST_ID, HeaderValue::from_static("mine"));
        let id = build(Context::background(), request).await.output.unwrap();

        assert_eq!(id, "mine");
    }

    #[tokio::test]
    async fn test_custom_header_and_generator() {
        let header = HeaderName::from_static("x-trace");
        let build = RequestIdBuilder::new()
            .with_header(header.clone())
            .with_generator(|| Ok("fixed".to_string()))
            .wrap(echo_id(header));
        let id = build(Context::background(), get()).await.output.unwrap();

        assert_eq!(id, "fixed");
    }

    #[tokio::test]
    async fn test_generator_failure() {
        let build = RequestIdBuilder::new()
            .with_generator(|| Err("entropy exhausted".into()))
            .wrap(echo_id(X_REQUEST_ID));
        let outcome = build(Context::background(), get()).await;

        assert!(outcome.output.is_none());
        assert_eq!(
            outcome.error.unwrap().to_string(),
            "request id builder, id generate failed, entropy exhausted"
        );
    }
}
