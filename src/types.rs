//! Core types and events

use crate::error::WriteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Passive subdomain enumeration through the source merger
    Enumerate,
    /// DNS liveness probe
    DnsProbe,
    /// HTTP liveness probe
    HttpProbe,
}

impl Stage {
    /// Stable lowercase name used in logs and notifications
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Enumerate => "enumerate",
            Stage::DnsProbe => "dns_probe",
            Stage::HttpProbe => "http_probe",
        }
    }

    /// Heading used for the notification sent when this stage finds new state
    pub fn headline(&self) -> &'static str {
        match self {
            Stage::Enumerate => "new subdomains",
            Stage::DnsProbe => "new subdomains with DNS",
            Stage::HttpProbe => "new subdomains with HTTP",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event of a line-oriented subdomain stream
///
/// Produced by the process runner, the source merger and the probes.
/// Every stream ends with exactly one [`SubEvent::Done`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubEvent {
    /// A hostname (or raw output line, at the process runner level)
    Sub(String),
    /// A non-fatal fault of one process
    Error {
        /// Name of the source or probe that failed
        source: String,
        /// Error message
        message: String,
    },
    /// Terminal event; nothing follows it
    Done,
}

/// Summary of one finished stage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StageReport {
    /// Project the stage ran for
    pub project: String,
    /// Which stage
    pub stage: Stage,
    /// Stage start time; the "what changed" read is filtered against it
    pub started_at: DateTime<Utc>,
    /// Number of candidates fed in (probe stages) or hostnames attributed (enumeration)
    pub candidates: usize,
    /// Number of positive lines received from the external tools
    pub positives: usize,
    /// Storage write failures (logged, not fatal)
    pub write_errors: Vec<WriteError>,
    /// Hostnames whose state became true during this stage
    pub new_hosts: Vec<String>,
}

/// Events emitted by the tracker
///
/// Subscribe with [`crate::Tracker::subscribe`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A stage started
    StageStarted {
        /// Project name
        project: String,
        /// Stage
        stage: Stage,
    },

    /// An enumerator or probe process reported a fault
    SourceFailed {
        /// Project name
        project: String,
        /// Stage the source belongs to
        stage: Stage,
        /// Source or probe name
        source: String,
        /// Error message
        error: String,
    },

    /// A stage found new state and notified about it
    NewHosts {
        /// Project name
        project: String,
        /// Stage
        stage: Stage,
        /// Total number of new hosts
        count: usize,
    },

    /// A stage finished
    StageCompleted {
        /// Project name
        project: String,
        /// Stage
        stage: Stage,
        /// Number of new hosts
        new_hosts: usize,
        /// Number of write failures
        write_errors: usize,
    },

    /// A stage aborted before reaching its reconcile step
    StageFailed {
        /// Project name
        project: String,
        /// Stage
        stage: Stage,
        /// Error message
        error: String,
    },

    /// A notification could not be delivered
    NotificationFailed {
        /// Notifier name
        notifier: String,
        /// Error message
        error: String,
    },

    /// Tracker is shutting down
    Shutdown,
}

impl Event {
    /// Event name used for SSE framing
    pub fn kind(&self) -> &'static str {
        match self {
            Event::StageStarted { .. } => "stage_started",
            Event::SourceFailed { .. } => "source_failed",
            Event::NewHosts { .. } => "new_hosts",
            Event::StageCompleted { .. } => "stage_completed",
            Event::StageFailed { .. } => "stage_failed",
            Event::NotificationFailed { .. } => "notification_failed",
            Event::Shutdown => "shutdown",
        }
    }
}
