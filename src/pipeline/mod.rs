//! Pipeline orchestration split into focused submodules.
//!
//! The [`Tracker`] struct and its methods are organized by domain:
//! - [`projects`] - Project and root domain management with input validation
//! - [`stages`] - Enumeration, DNS probe and HTTP probe stages
//! - [`triggers`] - Detached pipeline runs with per-project serialization
//! - [`lifecycle`] - Shutdown coordination
//!
//! A stage always follows the same shape: record its start time, run the
//! external tools, write everything back, then read what changed since the
//! start time and notify about it. The store is the only source of truth;
//! no subdomain state is kept in memory between stages.

mod lifecycle;
mod projects;
mod stages;
mod triggers;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::db::Database;
use crate::enumeration::SourceMerger;
use crate::error::Result;
use crate::notify::{self, Notifier};
use crate::probe::{DnsProbe, HttpProbe, Probe};
use crate::types::Event;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// External collaborators driven by the pipeline
///
/// Built from configuration by [`Components::from_config`]; tests and
/// embedders may assemble their own.
#[derive(Clone)]
pub struct Components {
    /// Passive enumerators, run concurrently
    pub merger: Arc<SourceMerger>,
    /// DNS liveness probe
    pub dns_probe: Arc<dyn Probe>,
    /// HTTP liveness probe
    pub http_probe: Arc<dyn Probe>,
    /// Notification channels, each sent every summary
    pub notifiers: Vec<Arc<dyn Notifier>>,
}

impl Components {
    /// Resolve every external binary and notifier from configuration
    pub fn from_config(config: &Config) -> Self {
        let merger = SourceMerger::from_tools(&config.tools, config.probe.process_timeout);
        let dns_probe = DnsProbe::from_config(&config.tools, &config.probe);
        let http_probe = HttpProbe::from_config(&config.tools, &config.probe);

        for enumerator in merger.enumerators() {
            tracing::debug!(source = %enumerator.name, program = ?enumerator.program, "enumerator configured");
        }

        Self {
            merger: Arc::new(merger),
            dns_probe: Arc::new(dns_probe),
            http_probe: Arc::new(http_probe),
            notifiers: notify::from_config(&config.notifications),
        }
    }
}

/// Bookkeeping for detached runs
#[derive(Clone)]
pub(crate) struct RunState {
    /// One async mutex per project; runs for the same project queue behind it
    pub(crate) project_locks:
        Arc<tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
    /// Parent of every run's cancellation token
    pub(crate) cancel: CancellationToken,
    /// Flag to indicate whether new runs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Every spawned run, awaited on shutdown
    pub(crate) tasks: TaskTracker,
}

impl RunState {
    fn new() -> Self {
        Self {
            project_locks: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            cancel: CancellationToken::new(),
            accepting_new: Arc::new(AtomicBool::new(true)),
            tasks: TaskTracker::new(),
        }
    }
}

/// Main tracker instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Tracker {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to query stored state
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Enumerators, probes and notifiers
    pub(crate) components: Components,
    /// Detached run bookkeeping
    pub(crate) runs: RunState,
}

impl Tracker {
    /// Create a tracker from configuration
    ///
    /// Validates the configuration, opens (and migrates) the database and
    /// resolves the external binaries.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.database_path).await?;
        let components = Components::from_config(&config);

        tracing::info!(
            database = %config.persistence.database_path.display(),
            notifiers = components.notifiers.len(),
            "tracker initialized"
        );

        Ok(Self::with_components(config, db, components))
    }

    /// Create a tracker around an open database and explicit collaborators
    pub fn with_components(config: Config, db: Database, components: Components) -> Self {
        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            components,
            runs: RunState::new(),
        }
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the configuration this tracker was built with
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Serve the REST API in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let tracker = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(tracker, config).await })
    }
}
