//! Cooperative cancellation token handed to in-flight probes.
//!
//! A thin `Arc<AtomicBool>` plus `tokio::sync::Notify` pair rather than
//! pulling in `tokio-util`'s `CancellationToken` — the scheduler only
//! needs a one-shot "please stop" signal, not child-token trees.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Signals a running probe that the scheduler has already decided a
/// winner and the probe's result no longer matters.
///
/// Cloning shares the same underlying flag: every clone observes a
/// single `cancel()` call.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    /// Creates a fresh, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Marks this token (and every clone of it) as cancelled, waking any
    /// task blocked in [`Self::cancelled`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// `true` if [`Self::cancel`] has already been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once this token is cancelled. A no-op future if it
    /// already was at the time of the call.
    ///
    /// `notify_waiters` only wakes tasks already registered as waiters, so
    /// checking `is_cancelled()` and then separately awaiting `notified()`
    /// would lose the wakeup if `cancel()` ran in between. `enable()`
    /// registers this call as a waiter up front, before the flag is
    /// re-checked, closing that window.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
