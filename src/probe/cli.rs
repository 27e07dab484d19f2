//! Probes backed by the dnsx and httpx binaries

use super::traits::Probe;
use crate::config::{ProbeConfig, ToolsConfig};
use crate::process::{LINE_BUFFER, LineCommand, run_lines};
use crate::types::SubEvent;
use crate::utils::{host_from_url, normalize_hostname};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// DNS liveness probe (`dnsx -silent`)
///
/// dnsx echoes back every input host that resolves.
#[derive(Debug, Clone)]
pub struct DnsProbe {
    binary_path: PathBuf,
    timeout: Duration,
}

impl DnsProbe {
    /// Create a probe with an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }

    /// Create a probe from configuration
    pub fn from_config(tools: &ToolsConfig, probe: &ProbeConfig) -> Self {
        Self::new(tools.resolve("dnsx"), probe.process_timeout)
    }

    fn command(&self, candidates: Vec<String>) -> LineCommand {
        LineCommand::new("dnsx", self.binary_path.clone(), self.timeout)
            .args(["-silent"])
            .stdin_lines(candidates)
    }
}

impl Probe for DnsProbe {
    fn name(&self) -> &str {
        "dnsx"
    }

    fn probe(&self, candidates: Vec<String>, cancel: CancellationToken) -> mpsc::Receiver<SubEvent> {
        normalized(run_lines(self.command(candidates), cancel), normalize_hostname)
    }
}

/// HTTP liveness probe (`httpx -silent -threads N`)
///
/// httpx prints a URL for each host that answers; only the hostname is kept.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    binary_path: PathBuf,
    threads: u32,
    timeout: Duration,
}

impl HttpProbe {
    /// Create a probe with an explicit binary path and concurrency
    pub fn new(binary_path: PathBuf, threads: u32, timeout: Duration) -> Self {
        Self {
            binary_path,
            threads,
            timeout,
        }
    }

    /// Create a probe from configuration
    pub fn from_config(tools: &ToolsConfig, probe: &ProbeConfig) -> Self {
        Self::new(
            tools.resolve("httpx"),
            probe.http_threads,
            probe.process_timeout,
        )
    }

    fn command(&self, candidates: Vec<String>) -> LineCommand {
        LineCommand::new("httpx", self.binary_path.clone(), self.timeout)
            .args(["-silent".to_string(), "-threads".to_string(), self.threads.to_string()])
            .stdin_lines(candidates)
    }
}

impl Probe for HttpProbe {
    fn name(&self) -> &str {
        "httpx"
    }

    fn probe(&self, candidates: Vec<String>, cancel: CancellationToken) -> mpsc::Receiver<SubEvent> {
        normalized(run_lines(self.command(candidates), cancel), host_from_url)
    }
}

/// Rewrite every `Sub` line through `normalize`, dropping lines it rejects
fn normalized(
    mut lines: mpsc::Receiver<SubEvent>,
    normalize: fn(&str) -> Option<String>,
) -> mpsc::Receiver<SubEvent> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    tokio::spawn(async move {
        while let Some(event) = lines.recv().await {
            let event = match event {
                SubEvent::Sub(line) => match normalize(&line) {
                    Some(host) => SubEvent::Sub(host),
                    None => {
                        tracing::debug!(line = %line, "dropping unparseable probe output");
                        continue;
                    }
                },
                other => other,
            };

            let done = event == SubEvent::Done;
            if tx.send(event).await.is_err() || done {
                break;
            }
        }
    });

    rx
}
