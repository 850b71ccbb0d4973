//! Shutdown coordination for graceful server shutdown.
//!
//! This module provides shared shutdown state so the HTTP server, the
//! connection handlers and the application's monitoring loop all observe the
//! same shutdown request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Shared shutdown state for coordinating graceful shutdown across components.
#[derive(Debug, Clone)]
pub struct ShutdownState {
    /// Set once shutdown is requested; observed by every waiter
    shutdown_initiated: Arc<watch::Sender<bool>>,
    /// Flag indicating the server has stopped and final cleanup can begin
    shutdown_complete: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Creates a new shutdown state with both flags set to false.
    pub fn new() -> Self {
        let (shutdown_initiated, _) = watch::channel(false);
        Self {
            shutdown_initiated: Arc::new(shutdown_initiated),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true if shutdown has been initiated - no new connections are accepted.
    pub fn is_shutdown_initiated(&self) -> bool {
        *self.shutdown_initiated.borrow()
    }

    /// Returns true if shutdown is complete and final cleanup can begin.
    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Initiates shutdown and wakes every task waiting in [`wait_for_shutdown`](Self::wait_for_shutdown).
    pub fn initiate_shutdown(&self) {
        if !self.shutdown_initiated.send_replace(true) {
            info!("🛑 Shutdown initiated - no new connections will be accepted");
        }
    }

    /// Marks shutdown as complete - the server has stopped serving.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ Server stopped - ready for final cleanup");
    }

    /// Resolves once shutdown has been initiated. Returns immediately if it
    /// already was.
    pub async fn wait_for_shutdown(&self) {
        let mut receiver = self.shutdown_initiated.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = receiver.wait_for(|initiated| *initiated).await;
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}
