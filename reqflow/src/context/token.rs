//! Cancellation token for cooperative cancellation.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use tracing::warn;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

/// A token for cooperative cancellation.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
/// A child token unregisters itself from its parent when dropped.
#[derive(Default)]
pub struct CancellationToken {
    /// Whether cancellation has been requested.
    cancelled: AtomicBool,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Callbacks to invoke on cancellation, keyed by registration id.
    callbacks: RwLock<Vec<(u64, CancelCallback)>>,
    /// Next registration id.
    next_id: AtomicU64,
    /// The parent and this token's registration on it.
    parent: Option<(Weak<CancellationToken>, u64)>,
    /// Wakes tasks parked in `cancelled()`.
    notify: Notify,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// This is idempotent - only the first reason is kept.
    /// Callbacks are invoked immediately. Panics in callbacks are logged and suppressed.
    pub fn cancel(&self, reason: impl Into<String>) {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.reason.write() = Some(reason.into());

            // Callbacks run unlocked: a child dropped inside one unregisters itself.
            let callbacks = std::mem::take(&mut *self.callbacks.write());
            for (_, callback) in &callbacks {
                invoke(callback.as_ref());
            }

            self.notify.notify_waiters();
        }
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.register(id, Box::new(callback));
    }

    fn register(&self, id: u64, callback: CancelCallback) {
        let mut callbacks = self.callbacks.write();
        if self.is_cancelled() {
            drop(callbacks);
            invoke(callback.as_ref());
        } else {
            callbacks.push((id, callback));
        }
    }

    fn unregister(&self, id: u64) {
        self.callbacks.write().retain(|(registered, _)| *registered != id);
    }

    /// Creates a token that is cancelled whenever this one is.
    ///
    /// Cancelling the child never affects the parent.
    #[must_use]
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let weak_parent: Weak<Self> = Arc::downgrade(self);
        let child = Arc::new(Self {
            cancelled: AtomicBool::new(false),
            reason: RwLock::new(None),
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            parent: Some((weak_parent.clone(), id)),
            notify: Notify::new(),
        });
        let weak_child: Weak<Self> = Arc::downgrade(&child);
        self.register(
            id,
            Box::new(move || {
                if let Some(child) = weak_child.upgrade() {
                    let reason = weak_parent
                        .upgrade()
                        .and_then(|p| p.reason())
                        .unwrap_or_else(|| "parent cancelled".to_string());
                    child.cancel(reason);
                }
            }),
        );
        child
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Waits until cancellation is requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

fn invoke(callback: &(dyn Fn() + Send + Sync)) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)) {
        warn!("Cancellation callback panicked: {:?}", e);
    }
}

impl Drop for CancellationToken {
    fn drop(&mut self) {
        if let Some((parent, id)) = &self.parent {
            if let Some(parent) = parent.upgrade() {
                parent.unregister(*id);
            }
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
