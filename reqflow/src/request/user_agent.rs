//! The `User-Agent` header.

use crate::context::Context;
use crate::core::Request;
use crate::pipeline::{BuildFn, Interceptor, StageFuture};
use http::header::{HeaderValue, USER_AGENT};
use std::sync::Arc;
use tracing::warn;

/// Sets `User-Agent: name/version` unless the request already has one.
///
/// Without a version the header is just the name. Without a name nothing is
/// set.
#[derive(Debug, Clone, Default)]
pub struct UserAgentBuilder {
    name: String,
    version: String,
}

impl UserAgentBuilder {
    /// Creates the builder.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Returns the header value this builder sets, if any.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        match (self.name.as_str(), self.version.as_str()) {
            ("", _) => None,
            (name, "") => Some(name.to_string()),
            (name, version) => Some(format!("{name}/{version}")),
        }
    }
}

impl<O: Send + 'static> Interceptor<BuildFn<O>> for UserAgentBuilder {
    fn wrap(&self, next: BuildFn<O>) -> BuildFn<O> {
        let value = self
            .header_value()
            .and_then(|value| match HeaderValue::try_from(value) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(error = %err, "User agent is not a valid header value, skipping");
                    None
                }
            });
        Arc::new(move |ctx: Context, mut request: Request| -> StageFuture<Option<O>> {
            if let Some(value) = &value {
                if request.header_str(&USER_AGENT).is_none() {
                    request.headers.insert(USER_AGENT, value.clone());
                }
            }
            next(ctx, request)
        })
    }
}
