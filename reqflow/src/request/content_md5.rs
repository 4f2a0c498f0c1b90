//! The `Content-MD5` header.

use crate::context::Context;
use crate::core::{Outcome, Request, RewindReader};
use crate::errors::{BoxError, Error, ErrorProbe};
use crate::pipeline::{BuildFn, Interceptor, StageFuture};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::{HeaderName, HeaderValue};
use md5::{Digest, Md5};
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// The checksum header.
pub const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// Checksumming the body failed.
#[derive(Debug, Error)]
#[error("request content md5 builder, {during} failed, {source}")]
pub struct ContentMd5Error {
    /// The step that failed.
    pub during: &'static str,
    /// The underlying failure.
    pub source: BoxError,
}

impl ErrorProbe for ContentMd5Error {}

/// Sets `Content-MD5` to the base64 MD5 digest of the remaining body.
///
/// The body must be seekable: it is read to the end and then rewound, so
/// the transport still sends every byte. An existing header or an empty
/// body is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMd5Builder;

fn checksum(request: &Request) -> Result<HeaderValue, ContentMd5Error> {
    let mut reader = RewindReader::new(&request.body).map_err(|err| ContentMd5Error {
        during: "new rewind reader",
        source: err.into(),
    })?;
    let mut hasher = Md5::new();
    io::copy(&mut reader, &mut hasher).map_err(|err| ContentMd5Error {
        during: "calculate body md5",
        source: err.into(),
    })?;
    reader.rewind().map_err(|err| ContentMd5Error {
        during: "body rewind",
        source: err.into(),
    })?;
    HeaderValue::try_from(STANDARD.encode(hasher.finalize())).map_err(|err| ContentMd5Error {
        during: "header encode",
        source: err.into(),
    })
}

impl<O: Send + 'static> Interceptor<BuildFn<O>> for ContentMd5Builder {
    fn wrap(&self, next: BuildFn<O>) -> BuildFn<O> {
        Arc::new(move |ctx: Context, mut request: Request| -> StageFuture<Option<O>> {
            if request.header_str(&CONTENT_MD5).is_some() || request.body.is_empty() {
                return next(ctx, request);
            }
            match checksum(&request) {
                Ok(value) => {
                    request.headers.insert(CONTENT_MD5, value);
                    next(ctx, request)
                }
                Err(err) => Box::pin(async move { Outcome::err(Error::probed(err)) }),
            }
        })
    }
}
