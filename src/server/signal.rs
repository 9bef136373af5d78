// Signal handling module
//
// SIGTERM and SIGINT (Ctrl+C) both trigger graceful shutdown: the accept
// loop stops, main returns Ok, and the process exits 0. Anything else is
// the supervisor's job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Shutdown coordination between the signal task and the accept loop.
pub struct ShutdownSignal {
    notify: Notify,
    requested: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
            requested: AtomicBool::new(false),
        }
    }

    /// Request shutdown and wake the accept loop.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Wait until shutdown is requested.
    ///
    /// Checks the flag first so a signal delivered before the accept loop
    /// started waiting is not lost.
    pub async fn notified(&self) {
        if self.requested.load(Ordering::SeqCst) {
            return;
        }
        self.notify.notified().await;
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the signal handler task (Unix)
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGINT handler: {e}"));
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => logger::log_signal("SIGTERM"),
            _ = sigint.recv() => logger::log_signal("SIGINT"),
        }

        shutdown.request();
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::log_signal("Ctrl+C");
            shutdown.request();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_before_wait_is_not_lost() {
        let shutdown = ShutdownSignal::new();
        shutdown.request();
        assert!(shutdown.is_requested());
        // Must resolve immediately rather than hang
        shutdown.notified().await;
    }

    #[tokio::test]
    async fn test_request_wakes_waiter() {
        let shutdown = Arc::new(ShutdownSignal::new());
        let waiter = Arc::clone(&shutdown);
        let handle = tokio::spawn(async move { waiter.notified().await });
        tokio::task::yield_now().await;
        shutdown.request();
        handle.await.unwrap();
    }
}
