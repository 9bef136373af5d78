// Accept loop module
// Accepts connections until a termination signal arrives, then drains.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::conn::accept_connection;
use super::signal::ShutdownSignal;
use crate::config::Config;
use crate::logger;

/// How long to wait for in-flight connections after the accept loop stops
const DRAIN_TIMEOUT_SECS: u64 = 5;

/// Run the accept loop until shutdown is requested.
///
/// Each accepted connection is served in its own task; an accept error is
/// logged and the loop continues. Returning from here means the process is
/// exiting gracefully.
pub async fn run_accept_loop(
    listener: TcpListener,
    cfg: Arc<Config>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<ShutdownSignal>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &cfg, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    // Stop accepting, then give in-flight connections a short window to
    // finish before the process exits
    drop(listener);
    drain_connections(&active_connections).await;
}

/// Wait for the connection counter to reach zero, bounded by the drain window.
async fn drain_connections(active_connections: &Arc<AtomicUsize>) {
    let deadline =
        tokio::time::Instant::now() + std::time::Duration::from_secs(DRAIN_TIMEOUT_SECS);

    while active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "{} connection(s) still open after {DRAIN_TIMEOUT_SECS}s drain window",
                active_connections.load(Ordering::SeqCst)
            ));
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}
