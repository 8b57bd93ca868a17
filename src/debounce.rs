//! Single-timer async debouncer.
//!
//! Converts a burst of raw edits into one settled commit: every call
//! supersedes the pending timer, and only a timer that survives the quiet
//! period uninterrupted fires. Shutdown cancels whatever is pending so a
//! late commit can never land in a torn-down table.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Debouncer {
    delay: Duration,
    cancel: CancellationToken,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            cancel: CancellationToken::new(),
            pending: Mutex::new(None),
        }
    }

    /// Schedule `fire` to run after the quiet period, superseding any pending
    /// schedule. Must be called inside a tokio runtime.
    pub fn schedule<F>(&self, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return;
        }

        let delay = self.delay;
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => fire.await,
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending timer, if any, without firing it.
    pub fn cancel_pending(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    /// Cancel pending and refuse all future schedules.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.cancel_pending();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_fires_once_with_last_value() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(Mutex::new(Vec::<String>::new()));

        for text in ["a", "ab", "abc"] {
            let fired = Arc::clone(&fired);
            debouncer.schedule(async move {
                fired.lock().unwrap().push(text.to_string());
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*fired.lock().unwrap(), vec!["abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_edits_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let count = Arc::clone(&count);
            debouncer.schedule(async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(700)).await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_and_refuses_new() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let count = Arc::new(AtomicUsize::new(0));

        {
            let count = Arc::clone(&count);
            debouncer.schedule(async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        debouncer.shutdown();

        {
            let count = Arc::clone(&count);
            debouncer.schedule(async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
