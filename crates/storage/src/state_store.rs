// SPDX-License-Identifier: MIT

//! The top-level state directory (§4.B): a directory tree under a
//! configurable root, owning the `sessions/`, `jobs/<job-id>/`, and
//! `docker-sessions/` subtrees.

use crate::job_store::{JobStore, JobStoreError};
use crate::session_store::SessionStore;
use chrono::{DateTime, Utc};
use herdctl_core::{Clock, JobId, JobStatus};
use std::io;
use std::path::{Path, PathBuf};

/// Default state directory root, relative to the daemon's working
/// directory (§4.B).
pub const DEFAULT_STATE_DIR: &str = ".herdctl";

/// Owns the whole on-disk tree: `sessions/`, `jobs/`, `docker-sessions/`.
///
/// Docker-side session storage is a distinct subtree from host sessions
/// (§4.D) — session files embed absolute paths that do not resolve
/// across the container boundary, so the two must never share a
/// directory.
pub struct StateStore<C: Clock> {
    root: PathBuf,
    pub jobs: JobStore,
    pub sessions: SessionStore<C>,
}

impl<C: Clock> StateStore<C> {
    /// Open (creating if absent) the state directory tree rooted at
    /// `root` (§4.G `start`: "open the state directory").
    pub fn open(root: impl Into<PathBuf>, clock: C) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("sessions"))?;
        std::fs::create_dir_all(root.join("jobs"))?;
        std::fs::create_dir_all(root.join("docker-sessions"))?;

        Ok(Self {
            jobs: JobStore::new(root.join("jobs")),
            sessions: SessionStore::new(root.join("sessions"), clock),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn docker_sessions_dir(&self) -> PathBuf {
        self.root.join("docker-sessions")
    }

    /// Delete every job whose terminal timestamp is older than
    /// `older_than`, optionally restricted to `status_filter`. Jobs
    /// still `pending`/`running` are never pruned regardless of age —
    /// a job only qualifies once it has a `completed_at` (§4.B "Job
    /// pruning": a maintenance action, never automatic or implicit on
    /// read). Returns the ids actually removed.
    pub fn prune_jobs(
        &self,
        older_than: DateTime<Utc>,
        status_filter: Option<&[JobStatus]>,
    ) -> Result<Vec<JobId>, JobStoreError> {
        let mut pruned = Vec::new();
        let job_ids = self.jobs.list_job_ids().map_err(|source| {
            crate::atomic::AtomicIoError::Read {
                path: self.root.join("jobs"),
                source,
            }
        })?;
        for name in job_ids {
            let job_id = JobId::from(name.as_str());
            let Some(metadata) = self.jobs.read_metadata(&job_id)? else {
                continue;
            };
            let Some(completed_at) = metadata.completed_at else {
                continue;
            };
            if completed_at >= older_than {
                continue;
            }
            if let Some(statuses) = status_filter {
                if !statuses.contains(&metadata.status) {
                    continue;
                }
            }
            self.jobs.delete(&job_id)?;
            pruned.push(job_id);
        }
        Ok(pruned)
    }
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
