//! Line-stream process runner
//!
//! Starts one external executable, optionally feeds it newline-delimited input
//! on stdin, and streams its stdout back as [`SubEvent::Sub`] lines followed by
//! exactly one [`SubEvent::Done`].

use crate::types::SubEvent;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the per-process line channel
pub const LINE_BUFFER: usize = 256;

/// Description of one external process invocation
#[derive(Debug, Clone)]
pub struct LineCommand {
    /// Name used in logs and error events
    pub name: String,
    /// Executable to run
    pub program: PathBuf,
    /// Command line arguments
    pub args: Vec<String>,
    /// Lines written to stdin (stdin is closed afterwards); `None` leaves stdin unattached
    pub stdin_lines: Option<Vec<String>>,
    /// Upper bound for the whole run; the child is killed when it expires
    pub timeout: Duration,
}

impl LineCommand {
    /// Create a command with no arguments and no input
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            stdin_lines: None,
            timeout,
        }
    }

    /// Append arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed these lines on stdin
    pub fn stdin_lines(mut self, lines: Vec<String>) -> Self {
        self.stdin_lines = Some(lines);
        self
    }
}

enum ReadOutcome {
    Eof,
    ReceiverGone,
    Failed(std::io::Error),
}

/// Run `command` in a background task and return its event stream
///
/// Spawn failures, read faults, timeouts and cancellation are reported as
/// [`SubEvent::Error`]; the stream always ends with one [`SubEvent::Done`],
/// whatever the exit code. Dropping the receiver kills the child.
pub fn run_lines(command: LineCommand, cancel: CancellationToken) -> mpsc::Receiver<SubEvent> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    tokio::spawn(async move {
        drive(command, &tx, cancel).await;
        tx.send(SubEvent::Done).await.ok();
    });

    rx
}

async fn drive(command: LineCommand, tx: &mpsc::Sender<SubEvent>, cancel: CancellationToken) {
    let name = command.name.clone();

    let mut child = match spawn(&command) {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(process = %name, program = ?command.program, error = %e, "failed to start process");
            send_error(tx, &name, format!("failed to start {}: {}", name, e)).await;
            return;
        }
    };

    if let Some(lines) = command.stdin_lines
        && let Some(mut stdin) = child.stdin.take()
    {
        let name = name.clone();
        // Written from its own task so a child that fills its stdout pipe
        // before draining stdin cannot deadlock us.
        tokio::spawn(async move {
            for line in lines {
                let mut buf = line.into_bytes();
                buf.push(b'\n');
                if let Err(e) = stdin.write_all(&buf).await {
                    tracing::debug!(process = %name, error = %e, "stdin closed early");
                    return;
                }
            }
            if let Err(e) = stdin.shutdown().await {
                tracing::debug!(process = %name, error = %e, "failed to close stdin");
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let name = name.clone();
        tokio::spawn(async move {
            // Drained to EOF whatever the encoding, or a chatty child blocks on a full pipe
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            while let Ok(n) = reader.read_until(b'\n', &mut buf).await {
                if n == 0 {
                    break;
                }
                tracing::trace!(process = %name, "stderr: {}", String::from_utf8_lossy(&buf).trim_end());
                buf.clear();
            }
        });
    }

    let Some(stdout) = child.stdout.take() else {
        send_error(tx, &name, format!("{} has no stdout", name)).await;
        kill(&mut child, &name).await;
        return;
    };

    let run = async {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        let outcome = loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break ReadOutcome::Eof,
                Ok(_) => {
                    // Not a hostname; the rest of the stream is still good
                    let Ok(line) = std::str::from_utf8(&buf) else {
                        tracing::warn!(process = %name, bytes = buf.len(), "skipping output line that is not valid UTF-8");
                        continue;
                    };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(SubEvent::Sub(line.to_string())).await.is_err() {
                        break ReadOutcome::ReceiverGone;
                    }
                }
                Err(e) => break ReadOutcome::Failed(e),
            }
        };

        match outcome {
            ReadOutcome::Eof => match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::warn!(process = %name, code = ?status.code(), "process exited with failure status");
                }
                Ok(_) => {
                    tracing::debug!(process = %name, "process finished");
                }
                Err(e) => {
                    send_error(tx, &name, format!("failed to wait for {}: {}", name, e)).await;
                }
            },
            ReadOutcome::ReceiverGone => {
                tracing::debug!(process = %name, "line receiver dropped, stopping process");
                kill(&mut child, &name).await;
            }
            ReadOutcome::Failed(e) => {
                tracing::warn!(process = %name, error = %e, "failed to read process output");
                send_error(tx, &name, format!("failed to read output of {}: {}", name, e)).await;
                kill(&mut child, &name).await;
            }
        }
    };

    let timeout = command.timeout;
    let interrupted = tokio::select! {
        _ = run => None,
        _ = tokio::time::sleep(timeout) => {
            tracing::warn!(process = %name, timeout = ?timeout, "process timed out");
            Some(format!("{} timed out after {:?}", name, timeout))
        }
        _ = cancel.cancelled() => {
            tracing::info!(process = %name, "process cancelled");
            Some(format!("{} cancelled", name))
        }
    };

    if let Some(message) = interrupted {
        send_error(tx, &name, message).await;
        kill(&mut child, &name).await;
    }
}

fn spawn(command: &LineCommand) -> std::io::Result<Child> {
    let stdin = if command.stdin_lines.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };

    Command::new(&command.program)
        .args(&command.args)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}

async fn kill(child: &mut Child, name: &str) {
    if let Err(e) = child.kill().await {
        tracing::debug!(process = %name, error = %e, "failed to kill process");
    }
}

async fn send_error(tx: &mpsc::Sender<SubEvent>, source: &str, message: String) {
    tx.send(SubEvent::Error {
        source: source.to_string(),
        message,
    })
    .await
    .ok();
}

/// Drain a stream until its terminal event
///
/// Returns the lines and error messages seen before [`SubEvent::Done`].
pub async fn collect(mut rx: mpsc::Receiver<SubEvent>) -> (Vec<String>, Vec<String>) {
    let mut lines = Vec::new();
    let mut errors = Vec::new();

    while let Some(event) = rx.recv().await {
        match event {
            SubEvent::Sub(line) => lines.push(line),
            SubEvent::Error { message, .. } => errors.push(message),
            SubEvent::Done => break,
        }
    }

    (lines, errors)
}
