//! Probe trait and verdict collection

use crate::types::SubEvent;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A liveness classifier backed by one external process per call
///
/// Candidates go in on stdin, one per line. Every `Sub` event names a
/// candidate that qualifies; a candidate never mentioned is negative. The
/// stream ends with exactly one `Done`.
pub trait Probe: Send + Sync {
    /// Name used in logs and events
    fn name(&self) -> &str;

    /// Start probing `candidates`
    fn probe(&self, candidates: Vec<String>, cancel: CancellationToken) -> mpsc::Receiver<SubEvent>;
}

/// A process-level fault reported during a probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFault {
    /// Probe or process name
    pub source: String,
    /// Error message
    pub message: String,
}

/// Everything one probe run said about its candidate set
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    /// Verdict per candidate; candidates absent from the output are `false`
    pub verdicts: HashMap<String, bool>,
    /// Number of positive lines that matched a candidate
    pub positives: usize,
    /// Faults reported while the probe ran
    pub faults: Vec<ProbeFault>,
}

impl ProbeOutcome {
    /// Whether the probe ran to completion without faults
    pub fn is_complete(&self) -> bool {
        self.faults.is_empty()
    }

    /// Verdicts that are safe to write back
    ///
    /// A faulted run (binary missing, timed out, cancelled) proves nothing
    /// about the hosts it never printed, so only its positives are kept.
    pub fn into_reconcilable(self) -> HashMap<String, bool> {
        if self.is_complete() {
            return self.verdicts;
        }

        self.verdicts.into_iter().filter(|(_, alive)| *alive).collect()
    }
}

/// Drain a probe stream into per-candidate verdicts
///
/// Every candidate is seeded `false`; each `Sub` naming a candidate flips it
/// to `true`. Output naming something outside the candidate set is ignored.
pub async fn gather_verdicts(
    candidates: &[String],
    mut rx: mpsc::Receiver<SubEvent>,
) -> ProbeOutcome {
    let mut outcome = ProbeOutcome {
        verdicts: candidates.iter().map(|c| (c.clone(), false)).collect(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    while let Some(event) = rx.recv().await {
        match event {
            SubEvent::Sub(host) => match outcome.verdicts.get_mut(&host) {
                Some(alive) => {
                    *alive = true;
                    if seen.insert(host) {
                        outcome.positives += 1;
                    }
                }
                None => {
                    tracing::debug!(host = %host, "probe reported a host outside the candidate set");
                }
            },
            SubEvent::Error { source, message } => {
                outcome.faults.push(ProbeFault { source, message });
            }
            SubEvent::Done => break,
        }
    }

    outcome
}
