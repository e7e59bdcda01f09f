// SPDX-License-Identifier: MIT

//! Container-runner error taxonomy (§7 `DockerError`).

use herdctl_core::HerdctlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("docker daemon unreachable: {0}")]
    DaemonUnreachable(String),
    #[error("failed to pull image {image}: {source}")]
    ImagePull { image: String, source: String },
    #[error("failed to create container: {0}")]
    Create(String),
    #[error("failed to start exec in container {container_id}: {source}")]
    Exec {
        container_id: String,
        source: String,
    },
    #[error("invalid volume mount spec {spec:?}: {reason}")]
    InvalidMount { spec: String, reason: String },
    #[error("agent-level docker config set forbidden field: {0}")]
    ForbiddenField(String),
}

impl ContainerError {
    /// Most container failures reaching here are about the daemon or
    /// image, not the job itself — treated as recoverable for reporting
    /// purposes (§7), except malformed configuration which never is.
    pub fn recoverable(&self) -> bool {
        !matches!(
            self,
            ContainerError::InvalidMount { .. } | ContainerError::ForbiddenField(_)
        )
    }
}

impl From<ContainerError> for HerdctlError {
    fn from(err: ContainerError) -> Self {
        HerdctlError::Docker {
            recoverable: err.recoverable(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
