//! A one-shot, clone-able cooperative cancellation signal.
//!
//! Deliberately hand-rolled on top of `tokio::sync::Notify` rather than
//! pulling in `tokio-util`'s `CancellationToken`: the turn controller only
//! ever needs a single fire-once signal per in-flight prompt, the same
//! shape as the `AtomicBool` shutdown signal in the correlation manager
//! this crate's session layer is grounded on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// The agent-facing half: check or wait for cancellation.
#[derive(Clone)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

/// The turn-controller-facing half: fire the signal.
#[derive(Clone)]
pub struct CancellationTrigger {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Build a linked (signal, trigger) pair for one prompt's lifetime.
pub fn cancellation_pair() -> (CancellationSignal, CancellationTrigger) {
    let inner = Arc::new(Inner {
        cancelled: AtomicBool::new(false),
        notify: Notify::new(),
    });
    (
        CancellationSignal {
            inner: inner.clone(),
        },
        CancellationTrigger { inner },
    )
}

impl CancellationSignal {
    /// Non-blocking check, for handlers that poll between steps.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Suspend until cancellation fires. Returns immediately if it already
    /// has. Intended for `tokio::select!` alongside the handler's own work.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl CancellationTrigger {
    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_wakes_a_waiting_signal() {
        let (signal, trigger) = cancellation_pair();
        assert!(!signal.is_cancelled());

        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move {
                signal.cancelled().await;
                signal.is_cancelled()
            }
        });

        tokio::task::yield_now().await;
        trigger.cancel();

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_if_already_fired() {
        let (signal, trigger) = cancellation_pair();
        trigger.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(50), signal.cancelled())
            .await
            .expect("cancelled() should not block once already cancelled");
    }
}
