//! Shutdown coordination.

use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::Tracker;

/// How long shutdown waits for running pipelines after cancelling them
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl Tracker {
    /// Gracefully shut down the tracker
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new pipeline runs
    /// 2. Cancels running pipelines, which kills their external processes
    /// 3. Waits for the runs to finish with a timeout (30 seconds)
    /// 4. Emits [`Event::Shutdown`] and closes the database pool
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.runs.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new pipeline runs");

        self.runs.cancel.cancel();
        self.runs.tasks.close();
        tracing::debug!(running = self.runs.tasks.len(), "Cancelled running pipelines");

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.runs.tasks.wait()).await {
            Ok(()) => tracing::info!("All pipeline runs finished"),
            Err(_) => {
                tracing::warn!("Timeout waiting for pipeline runs to finish, proceeding with shutdown");
            }
        }

        self.emit_event(Event::Shutdown);

        self.db.pool().close().await;

        tracing::info!("Graceful shutdown complete");
    }

    /// Whether [`Tracker::shutdown`] has started
    pub fn is_shutting_down(&self) -> bool {
        !self.runs.accepting_new.load(Ordering::SeqCst)
    }
}
