//! Enumeration, DNS probe and HTTP probe stages.

use crate::db::{NewSubdomain, StateAttribute, Subdomain};
use crate::error::{Error, Result, WriteError};
use crate::notify::format_summary;
use crate::probe::{Probe, gather_verdicts};
use crate::types::{Event, Stage, StageReport, SubEvent};
use crate::utils::{assign_root_domain, normalize_hostname};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tokio_util::sync::CancellationToken;

use super::Tracker;

impl Tracker {
    /// Enumerate a project's root domains and store the hostnames found
    ///
    /// Every hostname is attributed to the longest matching root domain;
    /// hostnames matching none are dropped with a warning. Hosts first seen
    /// during this stage are announced.
    pub async fn run_enumeration(
        &self,
        project: &str,
        cancel: &CancellationToken,
    ) -> Result<StageReport> {
        let stage = Stage::Enumerate;
        let started_at = self.start_stage(project, stage);

        let roots: Vec<String> = self
            .db
            .get_root_domains(project)
            .await?
            .into_iter()
            .map(|r| r.root_domain)
            .collect();

        if roots.is_empty() {
            tracing::warn!(project = %project, "project has no root domains, nothing to enumerate");
            return self
                .finish_stage(StageReport {
                    project: project.to_string(),
                    stage,
                    started_at,
                    candidates: 0,
                    positives: 0,
                    write_errors: Vec::new(),
                    new_hosts: Vec::new(),
                })
                .await;
        }

        tracing::info!(project = %project, roots = roots.len(), "enumerating subdomains");

        let mut rx = self.components.merger.merge(&roots, cancel.clone());
        let mut discovered: BTreeMap<String, String> = BTreeMap::new();
        let mut lines = 0usize;

        while let Some(event) = rx.recv().await {
            match event {
                SubEvent::Sub(line) => {
                    lines += 1;
                    let Some(host) = normalize_hostname(&line) else {
                        continue;
                    };
                    match assign_root_domain(&host, &roots) {
                        Some(root) => {
                            discovered
                                .entry(host)
                                .or_insert_with(|| root.to_string());
                        }
                        None => {
                            tracing::warn!(project = %project, subdomain = %host, "couldn't find root domain for subdomain");
                        }
                    }
                }
                SubEvent::Error { source, message } => {
                    self.source_failed(project, stage, source, message);
                }
                SubEvent::Done => break,
            }
        }

        let subdomains: Vec<NewSubdomain> = discovered
            .into_iter()
            .map(|(subdomain, root_domain)| NewSubdomain {
                root_domain,
                subdomain,
            })
            .collect();

        tracing::debug!(project = %project, lines, unique = subdomains.len(), "enumeration finished");

        let write_errors = self.db.upsert_subdomains(project, &subdomains).await;
        self.log_write_errors(project, stage, &write_errors);

        let new_hosts = hostnames(self.db.get_subdomains(project, Some(started_at)).await?);

        self.finish_stage(StageReport {
            project: project.to_string(),
            stage,
            started_at,
            candidates: subdomains.len(),
            positives: lines,
            write_errors,
            new_hosts,
        })
        .await
    }

    /// DNS-probe `candidates` (every stored subdomain when `None`) and reconcile
    ///
    /// Records the stage start as the project's `last_dns_probed` and
    /// announces hosts that started resolving during this stage.
    pub async fn run_dns_probe(
        &self,
        project: &str,
        candidates: Option<Vec<String>>,
        cancel: &CancellationToken,
    ) -> Result<StageReport> {
        let stage = Stage::DnsProbe;
        let started_at = self.start_stage(project, stage);

        let candidates = match candidates {
            Some(list) => normalize_candidates(list),
            None => hostnames(self.db.get_subdomains(project, None).await?),
        };

        let dns_probe = self.components.dns_probe.clone();
        let (positives, write_errors) = self
            .probe_and_reconcile(
                project,
                stage,
                dns_probe.as_ref(),
                StateAttribute::Dns,
                &candidates,
                cancel,
            )
            .await;

        self.db
            .set_project_last_dns_probed(project, started_at)
            .await?;

        let new_hosts = hostnames(
            self.db
                .get_subdomains_with_dns(project, Some(started_at))
                .await?,
        );

        self.finish_stage(StageReport {
            project: project.to_string(),
            stage,
            started_at,
            candidates: candidates.len(),
            positives,
            write_errors,
            new_hosts,
        })
        .await
    }

    /// HTTP-probe `candidates` (stored subdomains with DNS when `None`) and reconcile
    ///
    /// Announces hosts that started serving HTTP during this stage.
    pub async fn run_http_probe(
        &self,
        project: &str,
        candidates: Option<Vec<String>>,
        cancel: &CancellationToken,
    ) -> Result<StageReport> {
        let stage = Stage::HttpProbe;
        let started_at = self.start_stage(project, stage);

        let candidates = match candidates {
            Some(list) => normalize_candidates(list),
            None => hostnames(self.db.get_subdomains_with_dns(project, None).await?),
        };

        let http_probe = self.components.http_probe.clone();
        let (positives, write_errors) = self
            .probe_and_reconcile(
                project,
                stage,
                http_probe.as_ref(),
                StateAttribute::Http,
                &candidates,
                cancel,
            )
            .await;

        let new_hosts = hostnames(
            self.db
                .get_subdomains_with_http(project, Some(started_at))
                .await?,
        );

        self.finish_stage(StageReport {
            project: project.to_string(),
            stage,
            started_at,
            candidates: candidates.len(),
            positives,
            write_errors,
            new_hosts,
        })
        .await
    }

    /// Run enumerate, DNS probe and HTTP probe in order
    ///
    /// A failed stage is reported and the next one still runs; cancellation
    /// stops before the next stage starts.
    pub async fn run_full(&self, project: &str, cancel: &CancellationToken) -> Result<()> {
        for stage in [Stage::Enumerate, Stage::DnsProbe, Stage::HttpProbe] {
            if cancel.is_cancelled() {
                return Err(Error::ShuttingDown);
            }

            let result = match stage {
                Stage::Enumerate => self.run_enumeration(project, cancel).await,
                Stage::DnsProbe => self.run_dns_probe(project, None, cancel).await,
                Stage::HttpProbe => self.run_http_probe(project, None, cancel).await,
            };

            if let Err(e) = result {
                self.stage_failed(project, stage, &e);
            }
        }

        Ok(())
    }

    /// Probe the candidates and write the verdicts back
    ///
    /// Returns the number of positives and the write failures.
    async fn probe_and_reconcile(
        &self,
        project: &str,
        stage: Stage,
        probe: &dyn Probe,
        attribute: StateAttribute,
        candidates: &[String],
        cancel: &CancellationToken,
    ) -> (usize, Vec<WriteError>) {
        if candidates.is_empty() {
            tracing::info!(project = %project, stage = %stage, "no candidates to probe");
            return (0, Vec::new());
        }

        tracing::info!(
            project = %project,
            stage = %stage,
            probe = probe.name(),
            candidates = candidates.len(),
            "probing subdomains"
        );

        let rx = probe.probe(candidates.to_vec(), cancel.clone());
        let outcome = gather_verdicts(candidates, rx).await;

        for fault in &outcome.faults {
            self.source_failed(project, stage, fault.source.clone(), fault.message.clone());
        }

        if !outcome.is_complete() {
            tracing::warn!(
                project = %project,
                stage = %stage,
                "probe did not complete, only positive verdicts will be applied"
            );
        }

        let positives = outcome.positives;
        let verdicts = outcome.into_reconcilable();
        let write_errors = self.db.ensure_state(attribute, project, &verdicts).await;
        self.log_write_errors(project, stage, &write_errors);

        (positives, write_errors)
    }

    fn start_stage(&self, project: &str, stage: Stage) -> DateTime<Utc> {
        tracing::info!(project = %project, stage = %stage, "stage started");
        self.emit_event(Event::StageStarted {
            project: project.to_string(),
            stage,
        });
        Utc::now()
    }

    async fn finish_stage(&self, report: StageReport) -> Result<StageReport> {
        if !report.new_hosts.is_empty() {
            self.notify_new(&report.project, report.stage, &report.new_hosts)
                .await;
        }

        tracing::info!(
            project = %report.project,
            stage = %report.stage,
            candidates = report.candidates,
            positives = report.positives,
            new_hosts = report.new_hosts.len(),
            write_errors = report.write_errors.len(),
            "stage completed"
        );

        self.emit_event(Event::StageCompleted {
            project: report.project.clone(),
            stage: report.stage,
            new_hosts: report.new_hosts.len(),
            write_errors: report.write_errors.len(),
        });

        Ok(report)
    }

    /// Send one summary of `hosts` to every notifier
    ///
    /// Delivery failures are logged and emitted, never returned.
    pub(crate) async fn notify_new(&self, project: &str, stage: Stage, hosts: &[String]) {
        let message = format_summary(project, stage.headline(), hosts);

        tracing::info!(project = %project, stage = %stage, count = hosts.len(), "{} found", stage.headline());

        for notifier in &self.components.notifiers {
            if let Err(e) = notifier.text(&message).await {
                tracing::warn!(notifier = notifier.name(), project = %project, error = %e, "notification failed");
                self.emit_event(Event::NotificationFailed {
                    notifier: notifier.name().to_string(),
                    error: e.to_string(),
                });
            }
        }

        self.emit_event(Event::NewHosts {
            project: project.to_string(),
            stage,
            count: hosts.len(),
        });
    }

    fn source_failed(&self, project: &str, stage: Stage, source: String, message: String) {
        tracing::warn!(project = %project, stage = %stage, source = %source, error = %message, "source failed");
        self.emit_event(Event::SourceFailed {
            project: project.to_string(),
            stage,
            source,
            error: message,
        });
    }

    pub(crate) fn stage_failed(&self, project: &str, stage: Stage, error: &Error) {
        tracing::error!(project = %project, stage = %stage, error = %error, "stage failed");
        self.emit_event(Event::StageFailed {
            project: project.to_string(),
            stage,
            error: error.to_string(),
        });
    }

    fn log_write_errors(&self, project: &str, stage: Stage, errors: &[WriteError]) {
        for err in errors {
            tracing::error!(project = %project, stage = %stage, error = %err, "couldn't write subdomain state");
        }
    }
}

fn hostnames(subdomains: Vec<Subdomain>) -> Vec<String> {
    subdomains.into_iter().map(|s| s.subdomain).collect()
}

/// Lowercase caller-supplied candidates and drop blanks and duplicates, keeping order
fn normalize_candidates(list: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    list.iter()
        .filter_map(|raw| normalize_hostname(raw))
        .filter(|host| seen.insert(host.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::normalize_candidates;

    #[test]
    fn candidates_are_normalized_and_deduplicated() {
        let list = vec![
            "WWW.ex.com".to_string(),
            " ".to_string(),
            "api.ex.com.".to_string(),
            "www.ex.com".to_string(),
        ];

        assert_eq!(normalize_candidates(list), vec!["www.ex.com", "api.ex.com"]);
    }
}
