// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herdctl-storage: path-safety, atomic file I/O, and the on-disk state
//! directory (sessions, jobs, output logs) for the fleet supervisor
//! (§4.A, §4.B).

pub mod atomic;
pub mod job_store;
pub mod path_safety;
pub mod session_store;
pub mod state_store;

pub use atomic::{
    append_line, atomic_write, read_json_lines, read_yaml, AtomicIoError, JsonLinesRead,
};
pub use job_store::{JobStore, JobStoreError};
pub use path_safety::{build_safe_dir_path, build_safe_file_path, PathTraversalError};
pub use session_store::{SessionStore, SessionStoreError};
pub use state_store::{StateStore, DEFAULT_STATE_DIR};
