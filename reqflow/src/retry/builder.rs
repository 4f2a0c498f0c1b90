//! The Build-stage interceptor that repeats failed attempts.

use super::retryable::Retryable;
use super::retryer::{BasicRetryer, Retryer};
use crate::context::{CancelCause, Context};
use crate::core::{Body, Outcome, Request, RewindError, RewindReader};
use crate::errors::{Error, RetryError, RetryReason};
use crate::pipeline::{BuildFn, Interceptor, StageFuture};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retries the inner build chain according to a [`Retryer`].
///
/// Every attempt gets a fresh clone of the request. Before each retry the
/// body is restored to where it stood before the first attempt, so the peer
/// always receives the same bytes. Bodies that cannot seek fail the call
/// before a second attempt is made.
#[derive(Clone)]
pub struct RetryBuilder {
    retryer: Arc<dyn Retryer>,
}

impl Default for RetryBuilder {
    fn default() -> Self {
        Self::new(BasicRetryer::default())
    }
}

impl RetryBuilder {
    /// Creates the interceptor with a policy.
    pub fn new(retryer: impl Retryer + 'static) -> Self {
        Self {
            retryer: Arc::new(retryer),
        }
    }

    /// Creates the interceptor with a shared policy.
    #[must_use]
    pub fn from_arc(retryer: Arc<dyn Retryer>) -> Self {
        Self { retryer }
    }
}

impl fmt::Debug for RetryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryBuilder")
            .field("max_attempts", &self.retryer.max_attempts())
            .finish()
    }
}

impl<O: Send + 'static> Interceptor<BuildFn<O>> for RetryBuilder {
    fn wrap(&self, next: BuildFn<O>) -> BuildFn<O> {
        let retryer = self.retryer.clone();
        Arc::new(move |ctx: Context, request: Request| -> StageFuture<Option<O>> {
            let retryer = retryer.clone();
            let next = next.clone();
            Box::pin(async move { run(retryer.as_ref(), &next, ctx, request).await })
        })
    }
}

enum Rewind {
    Noop,
    Seek(RewindReader),
    Unsupported,
}

impl Rewind {
    fn capture(body: &Body) -> Result<Self, RewindError> {
        if body.is_empty() {
            Ok(Self::Noop)
        } else if body.is_seekable() {
            RewindReader::new(body).map(Self::Seek)
        } else {
            Ok(Self::Unsupported)
        }
    }

    fn rewind(&self) -> Result<(), RewindError> {
        match self {
            Self::Noop => Ok(()),
            Self::Seek(reader) => reader.rewind(),
            Self::Unsupported => Err(RewindError::NotSeekable),
        }
    }
}

async fn run<O>(
    retryer: &dyn Retryer,
    next: &BuildFn<O>,
    ctx: Context,
    request: Request,
) -> Outcome<Option<O>> {
    let rewind = match Rewind::capture(&request.body) {
        Ok(rewind) => rewind,
        Err(err) => {
            return Outcome::err(RetryError::new(0, RetryReason::RewindInit, Error::other(err)));
        }
    };

    let max_attempts = retryer.max_attempts();
    let mut attempts: u32 = 1;
    loop {
        let Outcome {
            output,
            metadata,
            error,
        } = next(ctx.clone(), request.clone()).await;
        let Some(err) = error else {
            return Outcome {
                output,
                metadata,
                error: None,
            };
        };

        let give_up = |reason: RetryReason, attempts: u32, cause: Error| {
            match reason {
                RetryReason::NotRetryable(_) => {
                    debug!(attempts, reason = %reason, error = %cause, "Request not retried");
                }
                _ => warn!(attempts, reason = %reason, error = %cause, "Giving up on request"),
            }
            Outcome {
                output: None,
                metadata: metadata.clone(),
                error: Some(RetryError::new(attempts, reason, cause).into()),
            }
        };

        if max_attempts > 0 && attempts >= max_attempts {
            return give_up(RetryReason::Exhausted { max_attempts }, attempts, err);
        }

        let verdict = retryer.check(&err);
        if verdict != Retryable::Yes {
            return give_up(RetryReason::NotRetryable(verdict), attempts, err);
        }

        attempts += 1;
        let delay = retryer.delay(attempts);
        debug!(
            attempt = attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Retrying request"
        );

        if let Err(cause) = sleep(&ctx, delay).await {
            return give_up(RetryReason::Canceled, attempts, cause.into());
        }
        if let Err(rewind_err) = rewind.rewind() {
            return give_up(RetryReason::RewindFailed, attempts, Error::other(rewind_err));
        }
    }
}

async fn sleep(ctx: &Context, delay: Duration) -> Result<(), CancelCause> {
    tokio::select! {
        biased;
        cause = ctx.done() => Err(cause),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
