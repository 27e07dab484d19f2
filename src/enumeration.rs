//! Source merger
//!
//! Runs every passive enumerator concurrently against the same root domains and
//! fans their output into one stream. Lines are forwarded raw; duplicates across
//! sources are left to the storage upsert.

use crate::config::ToolsConfig;
use crate::process::{LineCommand, run_lines};
use crate::types::SubEvent;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How an enumerator receives its target domains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainDelivery {
    /// Comma-joined list passed after `flag`
    Argument {
        /// Command line flag preceding the list (e.g. `-d`)
        flag: String,
    },
    /// One domain per line on stdin
    Stdin,
}

/// One passive subdomain source
#[derive(Debug, Clone)]
pub struct Enumerator {
    /// Source name, reported in error events
    pub name: String,
    /// Executable
    pub program: PathBuf,
    /// Fixed arguments placed before the domain argument
    pub args: Vec<String>,
    /// Domain calling convention
    pub delivery: DomainDelivery,
}

impl Enumerator {
    /// `amass enum -passive -nocolor -d a.com,b.com`
    pub fn amass(program: PathBuf) -> Self {
        Self {
            name: "amass".into(),
            program,
            args: vec!["enum".into(), "-passive".into(), "-nocolor".into()],
            delivery: DomainDelivery::Argument { flag: "-d".into() },
        }
    }

    /// `findomain --quiet --stdin`, domains on stdin
    pub fn findomain(program: PathBuf) -> Self {
        Self {
            name: "findomain".into(),
            program,
            args: vec!["--quiet".into(), "--stdin".into()],
            delivery: DomainDelivery::Stdin,
        }
    }

    /// `subfinder -silent -no-color -all -d a.com,b.com`
    pub fn subfinder(program: PathBuf) -> Self {
        Self {
            name: "subfinder".into(),
            program,
            args: vec!["-silent".into(), "-no-color".into(), "-all".into()],
            delivery: DomainDelivery::Argument { flag: "-d".into() },
        }
    }

    /// Build the process invocation for `domains`
    pub fn command(&self, domains: &[String], timeout: Duration) -> LineCommand {
        let command = LineCommand::new(self.name.clone(), self.program.clone(), timeout)
            .args(self.args.iter().cloned());

        match &self.delivery {
            DomainDelivery::Argument { flag } => command.args([flag.clone(), domains.join(",")]),
            DomainDelivery::Stdin => command.stdin_lines(domains.to_vec()),
        }
    }
}

/// The three enumerators of a standard installation
pub fn default_roster(tools: &ToolsConfig) -> Vec<Enumerator> {
    vec![
        Enumerator::amass(tools.resolve("amass")),
        Enumerator::findomain(tools.resolve("findomain")),
        Enumerator::subfinder(tools.resolve("subfinder")),
    ]
}

/// Fan-in of several enumerators
#[derive(Debug, Clone)]
pub struct SourceMerger {
    enumerators: Vec<Enumerator>,
    timeout: Duration,
}

impl SourceMerger {
    /// Create a merger over `enumerators`, each bounded by `timeout`
    pub fn new(enumerators: Vec<Enumerator>, timeout: Duration) -> Self {
        Self {
            enumerators,
            timeout,
        }
    }

    /// Merger over the standard roster
    pub fn from_tools(tools: &ToolsConfig, timeout: Duration) -> Self {
        Self::new(default_roster(tools), timeout)
    }

    /// Enumerators driven by this merger
    pub fn enumerators(&self) -> &[Enumerator] {
        &self.enumerators
    }

    /// Start every enumerator and return the combined stream
    ///
    /// `Sub` and `Error` events are forwarded as they arrive. A single `Done`
    /// follows once every source has finished; a source that fails to start
    /// still counts as finished.
    pub fn merge(&self, domains: &[String], cancel: CancellationToken) -> mpsc::Receiver<SubEvent> {
        let (tx, rx) = mpsc::channel(crate::process::LINE_BUFFER);

        if self.enumerators.is_empty() {
            tokio::spawn(async move {
                tx.send(SubEvent::Done).await.ok();
            });
            return rx;
        }

        let remaining = Arc::new(AtomicUsize::new(self.enumerators.len()));

        for enumerator in &self.enumerators {
            let mut source = run_lines(enumerator.command(domains, self.timeout), cancel.clone());
            let tx = tx.clone();
            let remaining = Arc::clone(&remaining);
            let name = enumerator.name.clone();

            tokio::spawn(async move {
                let mut forwarded = 0usize;
                while let Some(event) = source.recv().await {
                    match event {
                        SubEvent::Done => break,
                        SubEvent::Sub(line) => {
                            forwarded += 1;
                            if tx.send(SubEvent::Sub(line)).await.is_err() {
                                break;
                            }
                        }
                        error @ SubEvent::Error { .. } => {
                            if tx.send(error).await.is_err() {
                                break;
                            }
                        }
                    }
                }

                tracing::debug!(source = %name, lines = forwarded, "enumerator finished");

                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    tx.send(SubEvent::Done).await.ok();
                }
            });
        }

        rx
    }
}
