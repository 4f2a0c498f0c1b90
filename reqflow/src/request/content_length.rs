//! Declares the request body length.

use crate::context::Context;
use crate::core::{Body, Outcome, Request};
use crate::errors::{Error, ErrorProbe};
use crate::pipeline::{BuildFn, Interceptor, StageFuture};
use std::io::{self, SeekFrom};
use std::sync::Arc;
use thiserror::Error;

/// Measuring the body failed.
#[derive(Debug, Error)]
#[error("request content length builder, {during} failed, {source}")]
pub struct ContentLengthError {
    /// The step that failed.
    pub during: &'static str,
    /// The I/O failure.
    pub source: io::Error,
}

impl ErrorProbe for ContentLengthError {}

/// Sets the request content length from the bytes left in the body.
///
/// Seekable bodies are measured by seeking to the end and back, so the
/// cursor does not move. Forward-only bodies report the length they were
/// created with, or leave the length unknown. A body with nothing left is
/// replaced by the empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentLengthBuilder;

fn measure(body: &Body) -> Result<Option<u64>, ContentLengthError> {
    let fail =
        |during: &'static str| move |source: io::Error| ContentLengthError { during, source };

    if body.is_empty() {
        return Ok(Some(0));
    }
    if !body.is_seekable() {
        return body.remaining_len().map_err(fail("measure"));
    }
    let start = body.stream_position().map_err(fail("seek current"))?;
    let end = body.seek_to(SeekFrom::End(0)).map_err(fail("seek end"))?;
    body.seek_to(SeekFrom::Start(start)).map_err(fail("seek start"))?;
    Ok(Some(end.saturating_sub(start)))
}

impl<O: Send + 'static> Interceptor<BuildFn<O>> for ContentLengthBuilder {
    fn wrap(&self, next: BuildFn<O>) -> BuildFn<O> {
        Arc::new(move |ctx: Context, mut request: Request| -> StageFuture<Option<O>> {
            match measure(&request.body) {
                Ok(len) => {
                    if len == Some(0) {
                        request.body = Body::empty();
                    }
                    request.content_length = len;
                    next(ctx, request)
                }
                Err(err) => Box::pin(async move { Outcome::err(Error::probed(err)) }),
            }
        })
    }
}
