//! Shared test helpers for creating Tracker instances in tests.

use crate::config::Config;
use crate::db::Database;
use crate::enumeration::{DomainDelivery, Enumerator, SourceMerger};
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::pipeline::{Components, Tracker};
use crate::probe::Probe;
use crate::types::SubEvent;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Probe that answers from a fixed set of live hosts without spawning anything
pub(crate) struct ScriptedProbe {
    name: &'static str,
    alive: HashSet<String>,
    fault: Option<String>,
    delay: Duration,
    /// Candidate lists received, in call order
    pub(crate) calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedProbe {
    pub(crate) fn new(name: &'static str, alive: &[&str]) -> Self {
        Self {
            name,
            alive: alive.iter().map(|h| h.to_string()).collect(),
            fault: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report `message` as a process fault after the positives
    pub(crate) fn with_fault(mut self, message: &str) -> Self {
        self.fault = Some(message.to_string());
        self
    }

    /// Wait before answering (or until cancelled)
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Probe for ScriptedProbe {
    fn name(&self) -> &str {
        self.name
    }

    fn probe(&self, candidates: Vec<String>, cancel: CancellationToken) -> mpsc::Receiver<SubEvent> {
        self.calls.lock().unwrap().push(candidates.clone());

        let (tx, rx) = mpsc::channel(64);
        let alive = self.alive.clone();
        let fault = self.fault.clone();
        let delay = self.delay;
        let name = self.name.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    tx.send(SubEvent::Error { source: name, message: "cancelled".into() }).await.ok();
                    tx.send(SubEvent::Done).await.ok();
                    return;
                }
            }

            for host in candidates.into_iter().filter(|c| alive.contains(c)) {
                tx.send(SubEvent::Sub(host)).await.ok();
            }
            if let Some(message) = fault {
                tx.send(SubEvent::Error { source: name, message }).await.ok();
            }
            tx.send(SubEvent::Done).await.ok();
        });

        rx
    }
}

/// Notifier that keeps every message in memory
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn text(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(Error::Notification("channel unavailable".into()));
        }
        Ok(())
    }
}

/// Enumerator printing `lines` through /bin/sh
pub(crate) fn echo_enumerator(name: &str, lines: &[&str]) -> Enumerator {
    let script = lines
        .iter()
        .map(|l| format!("echo '{l}'"))
        .collect::<Vec<_>>()
        .join("; ");

    Enumerator {
        name: name.to_string(),
        program: "/bin/sh".into(),
        args: vec!["-c".into(), if script.is_empty() { "true".into() } else { script }],
        delivery: DomainDelivery::Argument {
            flag: "--domains".into(),
        },
    }
}

/// Collaborators for a tracker under test
pub(crate) struct TestKit {
    pub(crate) dns: Arc<ScriptedProbe>,
    pub(crate) http: Arc<ScriptedProbe>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) enumerators: Vec<Enumerator>,
}

impl TestKit {
    pub(crate) fn new(dns_alive: &[&str], http_alive: &[&str]) -> Self {
        Self {
            dns: Arc::new(ScriptedProbe::new("dnsx", dns_alive)),
            http: Arc::new(ScriptedProbe::new("httpx", http_alive)),
            notifier: Arc::new(RecordingNotifier::default()),
            enumerators: Vec::new(),
        }
    }

    fn components(&self) -> Components {
        let notifier: Arc<dyn Notifier> = self.notifier.clone();
        Components {
            merger: Arc::new(SourceMerger::new(
                self.enumerators.clone(),
                Duration::from_secs(10),
            )),
            dns_probe: self.dns.clone(),
            http_probe: self.http.clone(),
            notifiers: vec![notifier],
        }
    }
}

/// Helper to create a test Tracker with a persistent database and one project.
/// Returns the tracker and the tempdir (which must be kept alive).
pub(crate) async fn create_test_tracker(
    kit: &TestKit,
    project: &str,
    roots: &[&str],
) -> (Tracker, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");

    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();

    let tracker = Tracker::with_components(config, db, kit.components());

    tracker.add_project(project).await.unwrap();
    if !roots.is_empty() {
        let roots: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        assert!(tracker.add_root_domains(project, &roots).await.unwrap().is_empty());
    }

    (tracker, temp_dir)
}
