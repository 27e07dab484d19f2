//! # subnode
//!
//! Attack surface tracker: finds the subdomains of a project's root domains
//! with passive enumerators, probes which of them resolve and which serve
//! HTTP, and announces every change.
//!
//! ## How it works
//!
//! - **Projects** own a set of root domains.
//! - **Enumeration** runs amass, findomain and subfinder concurrently and
//!   stores each hostname under the longest matching root domain.
//! - **Probes** run dnsx and httpx over the stored hostnames. A host missing
//!   from the probe output is treated as down.
//! - **Reconciliation** records the first time a host was seen up and clears
//!   it once the host goes down, so "what changed since T" is a plain read.
//! - **Notifications** summarize every stage that found something new.
//!
//! External tools run as child processes; a stage never waits on the caller
//! and the caller never waits on a stage.
//!
//! ## Quick Start
//!
//! ```no_run
//! use subnode::{Config, Tracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = Tracker::new(Config::default()).await?;
//!
//!     tracker.add_project("acme").await?;
//!     tracker.add_root_domains("acme", &["acme.com".to_string()]).await?;
//!
//!     // Subscribe to events
//!     let mut events = tracker.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let run = tracker.check_new_subdomains("acme").await?;
//!     run.await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Passive enumerators and the source merger
pub mod enumeration;
/// Error types
pub mod error;
/// Change notifications
pub mod notify;
/// Pipeline orchestration (decomposed into focused submodules)
pub mod pipeline;
/// DNS and HTTP liveness probes
pub mod probe;
/// Line-oriented external process runner
pub mod process;
/// Core types and events
pub mod types;
/// Hostname utilities
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use db::{Database, Project, RootDomain, Subdomain};
pub use enumeration::{Enumerator, SourceMerger};
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus, WriteError};
pub use notify::{DiscordNotifier, NoOpNotifier, Notifier, WebhookNotifier};
pub use pipeline::{Components, Tracker};
pub use probe::{DnsProbe, HttpProbe, Probe};
pub use types::{Event, Stage, StageReport, SubEvent};

/// Helper function to run the tracker with graceful signal handling.
///
/// Waits for a termination signal and then calls [`Tracker::shutdown`].
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use subnode::{Config, Tracker, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let tracker = Tracker::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(&tracker).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(tracker: &Tracker) {
    let signal = termination_signal().await;
    tracing::info!(signal, "stopping tracker, running pipelines will be cancelled");
    tracker.shutdown().await;
}

/// Wait for the first termination signal and name it
#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in sandboxes; listen on whatever is left
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut term), Ok(mut int)) => tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
        },
        (Ok(mut term), Err(e)) => {
            tracing::warn!(error = %e, "no SIGINT handler, only SIGTERM stops the tracker");
            term.recv().await;
            "SIGTERM"
        }
        (Err(e), Ok(mut int)) => {
            tracing::warn!(error = %e, "no SIGTERM handler, only SIGINT stops the tracker");
            int.recv().await;
            "SIGINT"
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "no signal handlers registered, falling back to ctrl_c");
            tokio::signal::ctrl_c().await.ok();
            "ctrl-c"
        }
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    "ctrl-c"
}
