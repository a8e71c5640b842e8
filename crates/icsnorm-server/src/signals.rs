//! Shutdown signal handling.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) stop the HTTP listener gracefully:
//! in-flight requests finish, new connections are refused.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Listens for process signals and fans shutdown out to waiters.
#[derive(Debug)]
pub struct SignalHandler {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    /// Creates a handler that has not been triggered.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Spawns the signal listener task.
    ///
    /// If the SIGTERM handler cannot be installed, only Ctrl+C is watched.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Cannot install SIGTERM handler, watching Ctrl+C only");
                    if tokio::signal::ctrl_c().await.is_err() {
                        return;
                    }
                    info!("Received SIGINT, shutting down");
                }
            }
            let _ = tx.send(true);
            debug!("Signal listener stopped");
        });
    }

    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C, shutting down");
                let _ = tx.send(true);
            }
        });
    }

    /// Returns a future that completes once shutdown is signaled.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.rx.clone(),
        }
    }

    /// Returns true if shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Programmatically triggers a shutdown.
    pub fn trigger_shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// A signal that completes when shutdown is signaled.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal.
    ///
    /// Also returns if every sender is gone.
    pub async fn wait(mut self) {
        // wait_for checks the current value first
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
