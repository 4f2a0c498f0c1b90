//! The per-call context handed to every stage function.

use super::token::CancellationToken;
use crate::core::Key;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelCause {
    /// The context, or one of its ancestors, was canceled explicitly.
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

struct Inner {
    parent: Option<Context>,
    value: Option<(TypeId, Arc<dyn Any + Send + Sync>)>,
    token: Arc<CancellationToken>,
    deadline: Option<Instant>,
}

/// An immutable, chainable per-call context.
///
/// Deriving a child never changes the parent. Values are looked up on the
/// context itself first, then on its ancestors. Cancellation flows from a
/// parent to its children, never the other way.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Creates a root context with no values, no deadline and no way to cancel it.
    #[must_use]
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                parent: None,
                value: None,
                token: Arc::new(CancellationToken::new()),
                deadline: None,
            }),
        }
    }

    /// Returns a child context carrying `value` under `K`.
    #[must_use]
    pub fn with_value<K: Key>(&self, value: K::Value) -> Self {
        Self {
            inner: Arc::new(Inner {
                parent: Some(self.clone()),
                value: Some((TypeId::of::<K>(), Arc::new(value))),
                token: self.inner.token.clone(),
                deadline: self.inner.deadline,
            }),
        }
    }

    /// Looks up the value stored under `K` here or in an ancestor.
    #[must_use]
    pub fn value<K: Key>(&self) -> Option<&K::Value> {
        let wanted = TypeId::of::<K>();
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some((id, value)) = &ctx.inner.value {
                if *id == wanted {
                    return value.downcast_ref::<K::Value>();
                }
            }
            current = ctx.inner.parent.as_ref();
        }
        None
    }

    /// Returns a cancellable child and the handle that cancels it.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let token = self.inner.token.child();
        let ctx = self.derive(token.clone(), self.inner.deadline);
        (ctx, CancelHandle { token })
    }

    /// Returns a child that finishes at `deadline`, or earlier if the parent does.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.inner.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.derive(self.inner.token.clone(), Some(deadline))
    }

    /// Returns a child that finishes after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    fn derive(&self, token: Arc<CancellationToken>, deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner {
                parent: Some(self.clone()),
                value: None,
                token,
                deadline,
            }),
        }
    }

    /// Returns the deadline, if one is set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Reports why the context finished, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<CancelCause> {
        if self.inner.token.is_cancelled() {
            return Some(CancelCause::Canceled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns true once the context has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Waits until the context is canceled or its deadline passes.
    pub async fn done(&self) -> CancelCause {
        let token = &self.inner.token;
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => CancelCause::Canceled,
                    () = tokio::time::sleep_until(deadline) => CancelCause::DeadlineExceeded,
                }
            }
            None => {
                token.cancelled().await;
                CancelCause::Canceled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish_non_exhaustive()
    }
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: Arc<CancellationToken>,
}

impl CancelHandle {
    /// Cancels the context and all its descendants.
    pub fn cancel(&self) {
        self.token.cancel("canceled by caller");
    }

    /// Returns true once cancel has been called, or the parent was canceled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
