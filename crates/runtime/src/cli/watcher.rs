// SPDX-License-Identifier: MIT

//! Watches the CLI collaborator's session-log file for lines appended
//! out-of-band (§4.C: "the session file may be updated out-of-band by
//! the CLI; the watcher observes file changes with a small debounce
//! window... and emits new records appended since the last read
//! position"). Grounded on the teacher's incremental-offset JSONL
//! tailer (`agent::watcher::SessionLogParser`), generalized to emit
//! parsed [`OutputRecord`]s instead of an `AgentState`.

use crate::cancellation::CancellationToken;
use crate::cli::stdout_parser;
use herdctl_core::{HerdctlError, OutputRecord};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Debounce window collapsing bursts of filesystem change events into
/// one re-read, avoiding partial-write races (§4.C).
pub const DEBOUNCE: Duration = Duration::from_millis(75);

/// How long to wait for the session log to be created at all before
/// giving up (the CLI process may not have written it yet).
const WAIT_FOR_CREATION: Duration = Duration::from_secs(30);
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads only the lines appended to a growing JSONL file since the
/// last call, tracking a byte offset.
struct IncrementalReader {
    path: PathBuf,
    offset: u64,
}

impl IncrementalReader {
    fn new(path: PathBuf) -> Self {
        Self { path, offset: 0 }
    }

    /// Complete lines appended since the last read. An incomplete
    /// trailing line (write still in flight) is left for next time.
    fn read_new_lines(&mut self) -> std::io::Result<Vec<String>> {
        let file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len < self.offset {
            // File was truncated/replaced; start over.
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(self.offset))?;
        let mut lines = Vec::new();
        let mut advanced = self.offset;
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = reader.read_line(&mut buf)?;
            if n == 0 {
                break;
            }
            if !buf.ends_with('\n') {
                break; // incomplete trailing line, don't advance past it
            }
            advanced += n as u64;
            lines.push(buf.trim_end().to_string());
        }
        self.offset = advanced;
        Ok(lines)
    }
}

/// Spawns a background task tailing `path` and sending parsed records
/// (and the session id, when a `system` line introduces one) to `tx`.
/// The task exits once `tx` is dropped by the receiving side, or once
/// `done` fires — the CLI process ending is what bounds the tail, since
/// a session file has no "end of file" marker of its own (§4.C, §9
/// "the sequence is finite; it ends when ... the process exits").
pub fn spawn(
    path: PathBuf,
    tx: mpsc::Sender<Result<OutputRecord, HerdctlError>>,
    done: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !wait_for_creation(&path, &done).await {
            return;
        }

        let (fs_tx, mut fs_rx) = mpsc::channel(32);
        let _watcher = match create_watcher(&path, fs_tx) {
            Ok(w) => Some(w),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "session file watcher failed, relying on stdout alone");
                None
            }
        };
        if _watcher.is_none() {
            return;
        }

        let mut reader = IncrementalReader::new(path.clone());
        loop {
            // Drain the initial state in case lines were written before the watcher attached.
            match reader.read_new_lines() {
                Ok(lines) => {
                    for line in &lines {
                        for record in stdout_parser::parse_line(line, chrono::Utc::now()) {
                            if tx.send(Ok(record)).await.is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed reading session log");
                }
            }

            tokio::select! {
                event = fs_rx.recv() => {
                    if event.is_none() {
                        return;
                    }
                    // Drain any further events within the debounce window.
                    let _ = tokio::time::timeout(DEBOUNCE, async {
                        while fs_rx.recv().await.is_some() {}
                    }).await;
                }
                _ = done.cancelled() => {
                    // The process has ended; one last read picks up
                    // anything written right before exit, then stop.
                    if let Ok(lines) = reader.read_new_lines() {
                        for line in &lines {
                            for record in stdout_parser::parse_line(line, chrono::Utc::now()) {
                                let _ = tx.send(Ok(record)).await;
                            }
                        }
                    }
                    return;
                }
            }
        }
    })
}

async fn wait_for_creation(path: &Path, done: &CancellationToken) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT_FOR_CREATION;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(WAIT_POLL_INTERVAL) => {}
            _ = done.cancelled() => return false,
        }
    }
    tracing::warn!(path = %path.display(), "gave up waiting for session log to appear");
    false
}

fn create_watcher(
    path: &Path,
    tx: mpsc::Sender<()>,
) -> Result<RecommendedWatcher, notify::Error> {
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if res.is_ok() {
            let _ = tx.blocking_send(());
        }
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
