// SPDX-License-Identifier: MIT

//! Deriving the CLI collaborator's session-log path from a working
//! directory (§4.C: "the session path is deterministic: it derives from
//! the working directory by replacing every path separator... with
//! `-`"). Grounded on the teacher's `project_dir_name`/`find_session_log`,
//! adjusted to the spec's exact substitution rule (`/` and `\`, not
//! `/` and `.`).

use std::path::{Path, PathBuf};

/// Base directory the CLI collaborator keeps its per-project session
/// logs under. Honors `CLAUDE_CONFIG_DIR` like the real binary does,
/// falling back to `~/.claude`.
pub fn config_base_dir() -> PathBuf {
    std::env::var("CLAUDE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".claude"))
}

/// Replace every path separator with `-`, the substitution the spec
/// pins down exactly (§4.C).
pub fn sanitize_working_directory(working_directory: &Path) -> String {
    working_directory
        .to_string_lossy()
        .replace(['/', '\\'], "-")
}

/// The directory the CLI collaborator would write this working
/// directory's session logs into.
pub fn project_dir(claude_base: &Path, working_directory: &Path) -> PathBuf {
    claude_base
        .join("projects")
        .join(sanitize_working_directory(working_directory))
}

/// The exact session-log file for a known session id.
pub fn session_log_path(
    claude_base: &Path,
    working_directory: &Path,
    session_id: &str,
) -> PathBuf {
    project_dir(claude_base, working_directory).join(format!("{session_id}.jsonl"))
}

/// Find the most recently modified session log in a project directory,
/// for the case where the session id isn't known yet (first run, no
/// resume).
pub fn find_latest_session_log(claude_base: &Path, working_directory: &Path) -> Option<PathBuf> {
    let dir = project_dir(claude_base, working_directory);
    std::fs::read_dir(&dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "jsonl"))
        .max_by_key(|entry| entry.metadata().ok().and_then(|m| m.modified().ok()))
        .map(|entry| entry.path())
}

#[cfg(test)]
#[path = "session_path_tests.rs"]
mod tests;
