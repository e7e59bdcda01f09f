// SPDX-License-Identifier: MIT

//! Per-job persistence (§4.B): a metadata record and an append-only
//! output log under `jobs/<job-id>/`.

use crate::atomic::{append_line, atomic_write, read_json_lines, read_yaml, AtomicIoError};
use crate::path_safety::{build_safe_dir_path, PathTraversalError};
use herdctl_core::{JobId, JobMetadata, OutputRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error(transparent)]
    PathTraversal(#[from] PathTraversalError),
    #[error(transparent)]
    Io(#[from] AtomicIoError),
    #[error("failed to serialize job metadata: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error("failed to serialize output record: {0}")]
    SerializeOutput(#[from] serde_json::Error),
    #[error("failed to delete job directory {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Owns `<state>/jobs/`.
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn job_dir(&self, job_id: &JobId) -> Result<PathBuf, JobStoreError> {
        Ok(build_safe_dir_path(&self.root, job_id.as_str())?)
    }

    fn metadata_path(&self, job_id: &JobId) -> Result<PathBuf, JobStoreError> {
        Ok(self.job_dir(job_id)?.join("metadata.yaml"))
    }

    fn output_path(&self, job_id: &JobId) -> Result<PathBuf, JobStoreError> {
        Ok(self.job_dir(job_id)?.join("output.log"))
    }

    /// Persist (creating or overwriting) a job's metadata record.
    pub fn write_metadata(&self, metadata: &JobMetadata) -> Result<(), JobStoreError> {
        let job_id = JobId::from(metadata.id.as_str());
        let path = self.metadata_path(&job_id)?;
        let content = serde_yaml::to_string(metadata)?;
        atomic_write(&path, content.as_bytes())?;
        Ok(())
    }

    /// Read a job's metadata record, if present.
    pub fn read_metadata(&self, job_id: &JobId) -> Result<Option<JobMetadata>, JobStoreError> {
        let path = self.metadata_path(job_id)?;
        Ok(read_yaml(&path)?)
    }

    /// Append one output record to the job's output log.
    pub fn append_output(
        &self,
        job_id: &JobId,
        record: &OutputRecord,
    ) -> Result<(), JobStoreError> {
        let path = self.output_path(job_id)?;
        let line = serde_json::to_string(record)?;
        append_line(&path, &line)?;
        Ok(())
    }

    /// Read the job's full output log. Corrupted trailing lines (a
    /// writer mid-append) are dropped silently; corrupted middle lines
    /// fail the read — an output log is append-only and should never
    /// contain one unless the filesystem itself is misbehaving.
    pub fn read_output(&self, job_id: &JobId) -> Result<Vec<OutputRecord>, JobStoreError> {
        let path = self.output_path(job_id)?;
        let read = read_json_lines(&path, false)?;
        Ok(read.records)
    }

    /// List every job directory under the root, newest first by
    /// directory name (job ids sort lexically by date then suffix).
    pub fn list_job_ids(&self) -> std::io::Result<Vec<String>> {
        list_subdirectory_names(&self.root)
    }

    /// Remove a job's directory entirely. Deletion is an explicit
    /// administrative action (§4.B) — never performed automatically.
    pub fn delete(&self, job_id: &JobId) -> Result<(), JobStoreError> {
        let dir = self.job_dir(job_id)?;
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .map_err(|source| JobStoreError::Delete { path: dir, source })?;
        }
        Ok(())
    }
}

pub(crate) fn list_subdirectory_names(root: &Path) -> std::io::Result<Vec<String>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
