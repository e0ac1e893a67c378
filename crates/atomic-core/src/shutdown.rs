//! Process-wide shutdown signal.
//!
//! One [`ShutdownState`] is created by the server and shared (behind an
//! `Arc`) with every scheduler job, the click-buffer sweep and the HTTP
//! server's graceful-shutdown future. Loops check
//! [`is_stop_requested`](ShutdownState::is_stop_requested) between passes
//! and race their sleeps against [`wait`](ShutdownState::wait).

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Shared stop flag with wake-up notification.
#[derive(Debug, Default)]
pub struct ShutdownState {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes every task parked in [`wait`](Self::wait).
    notify: Notify,
}

impl ShutdownState {
    /// Create a state with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    ///
    /// Returns immediately if the flag is already set.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }
}
