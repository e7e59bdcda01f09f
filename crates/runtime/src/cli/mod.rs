// SPDX-License-Identifier: MIT

//! The CLI subprocess runner (§4.C): spawns the configured command,
//! parses its `stream-json` stdout, and merges in records the session
//! file watcher picks up out-of-band.

mod runner;
mod session_path;
pub mod stdout_parser;
pub mod watcher;

pub use runner::{cli_args, CliRunner, DEFAULT_CLI_COMMAND};
pub use session_path::{
    config_base_dir, find_latest_session_log, project_dir, sanitize_working_directory,
    session_log_path,
};
