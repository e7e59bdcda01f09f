// SPDX-License-Identifier: MIT

//! Atomic file writes and retrying reads (§4.A).
//!
//! Writes go to a sibling tempfile with a random suffix, fsync, then
//! rename over the target — the classic write-tempfile-then-rename
//! pattern used throughout this codebase for crash-safe persistence.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AtomicIoError {
    #[error("io error writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("io error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid json line in {path}: {source}")]
    JsonLine {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Number of rename retries on transient failures (§4.A).
const RENAME_MAX_ATTEMPTS: u32 = 3;
const RENAME_BACKOFF_BASE_MS: u64 = 20;

/// Write `content` to `path` atomically: tempfile + rename, with retry
/// on transient rename failures (EACCES/EPERM — seen on some network
/// filesystems and on Windows when a reader still has the old file
/// open). The temp file is unlinked on any failure path.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), AtomicIoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| AtomicIoError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = sibling_tmp_path(path);
    let write_result = (|| -> io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(source) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(AtomicIoError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    let mut attempt = 0;
    loop {
        match fs::rename(&tmp_path, path) {
            Ok(()) => return Ok(()),
            Err(source)
                if attempt + 1 < RENAME_MAX_ATTEMPTS
                    && matches!(
                        source.kind(),
                        io::ErrorKind::PermissionDenied | io::ErrorKind::WouldBlock
                    ) =>
            {
                attempt += 1;
                warn!(
                    path = %path.display(),
                    attempt,
                    error = %source,
                    "atomic rename failed, retrying",
                );
                std::thread::sleep(Duration::from_millis(
                    RENAME_BACKOFF_BASE_MS * 2u64.pow(attempt - 1),
                ));
            }
            Err(source) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(AtomicIoError::Write {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Append `line` (without a trailing newline; one is added) to a
/// line-delimited log file, creating it if absent. Used for the output
/// log (§3, §6) — appends are not renamed-over because multiple writers
/// stream into the same file over the job's lifetime; durability comes
/// from `O_APPEND` + `fsync`, which POSIX guarantees is atomic for
/// writes smaller than `PIPE_BUF`.
pub fn append_line(path: &Path, line: &str) -> Result<(), AtomicIoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| AtomicIoError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AtomicIoError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    writeln!(file, "{line}").map_err(|source| AtomicIoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    file.sync_all().map_err(|source| AtomicIoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    use rand::Rng;
    let mut rng = rand::rng();
    let suffix: String = (0..8)
        .map(|_| format!("{:x}", rng.random::<u8>() % 16))
        .collect();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.{suffix}.tmp"))
}

/// Read and parse a YAML file. Empty files yield `None`. Retries once on
/// parse errors that look like a concurrent partial write (the file
/// exists but is not valid YAML); does not retry on ENOENT/EACCES/EPERM.
pub fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, AtomicIoError> {
    const PARSE_RETRY_ATTEMPTS: u32 = 3;
    const PARSE_RETRY_DELAY: Duration = Duration::from_millis(15);

    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(AtomicIoError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if bytes.is_empty() {
        return Ok(None);
    }

    let mut current = bytes;
    let mut attempt = 0;
    loop {
        match serde_yaml::from_slice::<T>(&current) {
            Ok(value) => return Ok(Some(value)),
            Err(source) => {
                attempt += 1;
                if attempt >= PARSE_RETRY_ATTEMPTS {
                    return Err(AtomicIoError::Parse {
                        path: path.to_path_buf(),
                        source,
                    });
                }
                std::thread::sleep(PARSE_RETRY_DELAY);
                // A concurrent writer may have completed while we waited.
                current = fs::read(path).unwrap_or(current);
            }
        }
    }
}

/// Result of reading a line-delimited log (§4.A, §6, §8 boundary
/// behaviors).
#[derive(Debug, Default)]
pub struct JsonLinesRead<T> {
    pub records: Vec<T>,
    /// Lines dropped: a trailing incomplete line, or (in `skip_invalid`
    /// mode) an invalid middle line.
    pub skipped_lines: usize,
}

/// Read a line-delimited JSON file. A trailing incomplete line (no
/// final newline and parse failure) is dropped and counted. An invalid
/// *middle* line fails the whole read unless `skip_invalid` is set, in
/// which case it is counted and skipped instead.
pub fn read_json_lines<T: serde::de::DeserializeOwned>(
    path: &Path,
    skip_invalid: bool,
) -> Result<JsonLinesRead<T>, AtomicIoError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            return Ok(JsonLinesRead::default())
        }
        Err(source) => {
            return Err(AtomicIoError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let reader = BufReader::new(file);
    let mut out = JsonLinesRead::default();
    let mut lines = reader.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.map_err(|source| AtomicIoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if line.is_empty() {
            continue;
        }
        let is_last = lines.peek().is_none();
        match serde_json::from_str::<T>(&line) {
            Ok(record) => out.records.push(record),
            Err(_) if is_last => {
                // Trailing partial line from a write still in flight.
                out.skipped_lines += 1;
            }
            Err(source) => {
                if skip_invalid {
                    out.skipped_lines += 1;
                } else {
                    return Err(AtomicIoError::JsonLine {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
