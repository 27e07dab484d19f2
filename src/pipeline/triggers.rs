//! Detached pipeline runs.
//!
//! A trigger checks its preconditions, spawns the run and returns at once;
//! the caller never waits for external tools. Runs for the same project are
//! serialized behind a per-project lock, runs for different projects proceed
//! concurrently.

use crate::error::{Error, Result};
use crate::types::Stage;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::task::JoinHandle;

use super::Tracker;
use super::projects::require_project_name;

/// What a detached run executes
#[derive(Debug, Clone)]
enum Run {
    Full,
    Dns(Option<Vec<String>>),
    Http(Option<Vec<String>>),
}

impl Tracker {
    /// Start the full pipeline (enumerate, DNS probe, HTTP probe) for a project
    ///
    /// Returns as soon as the project is known to exist. The handle resolves
    /// when the run finishes; dropping it does not stop the run.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty name, [`Error::ProjectNotFound`] for
    /// an unknown project and [`Error::ShuttingDown`] once shutdown started.
    pub async fn check_new_subdomains(&self, project: &str) -> Result<JoinHandle<()>> {
        self.trigger(project, Run::Full).await
    }

    /// Start a DNS probe stage
    ///
    /// With `candidates` set only those hosts are probed; otherwise every
    /// stored subdomain is.
    pub async fn trigger_dns_probe(
        &self,
        project: &str,
        candidates: Option<Vec<String>>,
    ) -> Result<JoinHandle<()>> {
        self.trigger(project, Run::Dns(candidates)).await
    }

    /// Start an HTTP probe stage
    ///
    /// With `candidates` set only those hosts are probed; otherwise every
    /// stored subdomain that currently resolves is.
    pub async fn trigger_http_probe(
        &self,
        project: &str,
        candidates: Option<Vec<String>>,
    ) -> Result<JoinHandle<()>> {
        self.trigger(project, Run::Http(candidates)).await
    }

    async fn trigger(&self, project: &str, run: Run) -> Result<JoinHandle<()>> {
        if !self.runs.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let project = require_project_name(project)?;
        if self.db.get_project(project).await?.is_none() {
            return Err(Error::ProjectNotFound(project.to_string()));
        }

        let lock = self.project_lock(project).await;
        let tracker = self.clone();
        let cancel = self.runs.cancel.child_token();
        let project = project.to_string();

        tracing::debug!(project = %project, run = ?run, "pipeline run accepted");

        let handle = self.runs.tasks.spawn(async move {
            let _guard = lock.lock().await;

            if cancel.is_cancelled() {
                tracing::info!(project = %project, "run cancelled before it started");
                return;
            }

            match run {
                Run::Full => {
                    if let Err(e) = tracker.run_full(&project, &cancel).await {
                        tracing::info!(project = %project, error = %e, "full pipeline stopped early");
                    }
                }
                Run::Dns(candidates) => {
                    if let Err(e) = tracker.run_dns_probe(&project, candidates, &cancel).await {
                        tracker.stage_failed(&project, Stage::DnsProbe, &e);
                    }
                }
                Run::Http(candidates) => {
                    if let Err(e) = tracker.run_http_probe(&project, candidates, &cancel).await {
                        tracker.stage_failed(&project, Stage::HttpProbe, &e);
                    }
                }
            }
        });

        Ok(handle)
    }

    async fn project_lock(&self, project: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.runs.project_locks.lock().await;
        locks
            .entry(project.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
