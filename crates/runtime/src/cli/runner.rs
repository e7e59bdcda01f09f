// SPDX-License-Identifier: MIT

//! Spawns the CLI collaborator, feeds the prompt on stdin, and merges
//! its stdout stream with the session-log watcher into one ordered
//! [`OutputRecord`] stream (§4.C, §9 "Control-flow resembling
//! coroutines").
//!
//! Grounded on the teacher's subprocess timeout/kill discipline
//! (`oj_adapters::subprocess::run_with_timeout`) adapted from a
//! wait-for-output shape to a streaming one, and on the corpus's CLI
//! flag names (`-p`, `--resume`, `--fork-session`, `--max-turns`,
//! `--allowedTools`/`--disallowedTools`, `--dangerously-skip-permissions`)
//! seen across the other example providers.

use crate::cancellation::CancellationToken;
use crate::cli::session_path::{config_base_dir, find_latest_session_log, session_log_path};
use crate::cli::{stdout_parser, watcher};
use crate::options::RuntimeOptions;
use crate::runtime::{Runtime, RuntimeExecution, SessionIdHandle};
use async_trait::async_trait;
use herdctl_core::{HerdctlError, OutputRecord, PermissionMode, RuntimeKind};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Default CLI command when the agent doesn't override it (§4.C, §6).
pub const DEFAULT_CLI_COMMAND: &str = "claude";

const SESSION_LOG_WAIT: Duration = Duration::from_secs(30);
const SESSION_LOG_POLL: Duration = Duration::from_millis(100);
const KILL_GRACE: Duration = Duration::from_secs(10);

/// A [`Runtime`] backed by spawning the configured CLI command as a
/// subprocess (§4.C).
#[derive(Debug, Default)]
pub struct CliRunner;

impl CliRunner {
    pub fn new() -> Self {
        Self
    }

    fn command_name(options: &RuntimeOptions) -> String {
        match &options.agent.runtime {
            RuntimeKind::Cli {
                command: Some(command),
            } => command.clone(),
            _ => DEFAULT_CLI_COMMAND.to_string(),
        }
    }

    fn build_command(options: &RuntimeOptions) -> Command {
        let mut command = Command::new(Self::command_name(options));
        command
            .args(cli_args(options))
            .current_dir(&options.agent.working_directory)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// Builds the CLI argument list for one run from its [`RuntimeOptions`]
/// (§4.C, §6). Shared with the container decorator (§4.D), which
/// re-expresses the same job as an equivalent in-container command
/// invocation rather than calling this runner's `execute` directly.
pub fn cli_args(options: &RuntimeOptions) -> Vec<String> {
    let mut args = vec!["-p".to_string()];

    if let Some(resume) = &options.resume_session_id {
        args.push("--resume".to_string());
        args.push(resume.clone());
    }
    if let Some(fork) = &options.fork_session_id {
        args.push("--fork-session".to_string());
        args.push(fork.clone());
    }
    if options.agent.permissions.mode == PermissionMode::BypassPermissions {
        args.push("--dangerously-skip-permissions".to_string());
    }
    if let Some(max_turns) = options.agent.max_turns {
        args.push("--max-turns".to_string());
        args.push(max_turns.to_string());
    }
    if let Some(system_prompt) = &options.agent.system_prompt {
        args.push("--append-system-prompt".to_string());
        args.push(system_prompt.clone());
    }
    for tool in &options.agent.tool_allowed {
        args.push("--allowedTools".to_string());
        args.push(tool.clone());
    }
    for tool in &options.agent.tool_denied {
        args.push("--disallowedTools".to_string());
        args.push(tool.clone());
    }

    args
}

#[async_trait]
impl Runtime for CliRunner {
    async fn execute(&self, options: RuntimeOptions) -> Result<RuntimeExecution, HerdctlError> {
        options
            .validate()
            .map_err(|err| HerdctlError::RuntimeInitialization {
                message: err.to_string(),
                recoverable: false,
            })?;

        let command_name = Self::command_name(&options);
        let mut command = Self::build_command(&options);
        let mut child = command
            .spawn()
            .map_err(|err| HerdctlError::RuntimeInitialization {
                message: format!("failed to spawn {command_name}: {err}"),
                recoverable: false,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| HerdctlError::RuntimeInitialization {
                message: "cli process exposed no stdin".to_string(),
                recoverable: false,
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HerdctlError::RuntimeInitialization {
                message: "cli process exposed no stdout".to_string(),
                recoverable: false,
            })?;

        let prompt = options.prompt.clone();
        tokio::spawn(async move {
            let _ = stdin.write_all(prompt.as_bytes()).await;
            let _ = stdin.shutdown().await;
        });

        let session_id: SessionIdHandle = Arc::new(Mutex::new(None));
        let (tx, rx) = mpsc::channel(256);

        // The watcher tails the session file for as long as it's polling
        // or blocked in `fs_rx.recv()`, which a failed send never ends on
        // its own — it needs telling when the process itself is done, or
        // the merged stream below never yields `None` (§4.C, §9).
        let done = CancellationToken::new();

        spawn_stdout_reader(stdout, tx.clone(), session_id.clone());
        spawn_session_watcher(&options, tx.clone(), done.clone());
        spawn_process_supervisor(child, options.cancellation.clone(), tx, done);

        Ok(RuntimeExecution::new(Box::pin(ReceiverStream::new(rx))))
    }
}

/// Reads stdout line by line, parsing each as a `stream-json` record
/// (§4.C "Stdout parser"). Captures the external session id from the
/// first `system` line it sees.
fn spawn_stdout_reader(
    stdout: ChildStdout,
    tx: mpsc::Sender<Result<OutputRecord, HerdctlError>>,
    session_id: SessionIdHandle,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if session_id.lock().is_none() {
                        if let Some(id) = stdout_parser::extract_session_id(&line) {
                            *session_id.lock() = Some(id);
                        }
                    }
                    for record in stdout_parser::parse_line(&line, chrono::Utc::now()) {
                        if tx.send(Ok(record)).await.is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => return,
                Err(err) => {
                    let _ = tx
                        .send(Err(HerdctlError::RuntimeStreaming {
                            message: format!("failed reading cli stdout: {err}"),
                            recoverable: false,
                        }))
                        .await;
                    return;
                }
            }
        }
    });
}

/// Waits for the CLI collaborator's session-log file to exist (the
/// exact file when resuming, or the newest file in the project
/// directory on a fresh run), then hands off to [`watcher::spawn`]
/// (§4.C "Session-file watcher").
fn spawn_session_watcher(
    options: &RuntimeOptions,
    tx: mpsc::Sender<Result<OutputRecord, HerdctlError>>,
    done: CancellationToken,
) {
    let claude_base = config_base_dir();
    let working_directory = options.agent.working_directory.clone();
    let resume = options.resume_session_id.clone();
    tokio::spawn(async move {
        let path = match resume {
            Some(session_id) => session_log_path(&claude_base, &working_directory, &session_id),
            None => match wait_for_session_log(&claude_base, &working_directory, &done).await {
                Some(path) => path,
                None => return,
            },
        };
        watcher::spawn(path, tx, done);
    });
}

async fn wait_for_session_log(
    claude_base: &Path,
    working_directory: &Path,
    done: &CancellationToken,
) -> Option<PathBuf> {
    let deadline = tokio::time::Instant::now() + SESSION_LOG_WAIT;
    while tokio::time::Instant::now() < deadline {
        if let Some(path) = find_latest_session_log(claude_base, working_directory) {
            return Some(path);
        }
        tokio::select! {
            _ = tokio::time::sleep(SESSION_LOG_POLL) => {}
            _ = done.cancelled() => return None,
        }
    }
    None
}

/// Waits for the child to exit, or for cancellation — in which case it
/// kills the process (bounded by [`KILL_GRACE`]) and emits the terminal
/// cancelled record (§5 "Cancellation semantics", §8 S4). Either way,
/// fires `done` so the session watcher stops tailing and drops its
/// sender — the process ending is what finishes the merged stream.
fn spawn_process_supervisor(
    mut child: Child,
    cancellation: CancellationToken,
    tx: mpsc::Sender<Result<OutputRecord, HerdctlError>>,
    done: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancellation.cancelled() => {
                let _ = child.start_kill();
                let _ = tokio::time::timeout(KILL_GRACE, child.wait()).await;
                let _ = tx.send(Ok(OutputRecord::cancelled(chrono::Utc::now()))).await;
            }
            status = child.wait() => {
                if let Ok(status) = status {
                    if !status.success() {
                        tracing::warn!(?status, "cli process exited non-zero");
                    }
                }
            }
        }
        done.cancel();
    });
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
