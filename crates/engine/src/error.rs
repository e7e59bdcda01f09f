// SPDX-License-Identifier: MIT

//! Job-lifecycle and schedule-engine error taxonomy (§4.E, §4.F, §7).

use herdctl_core::{HerdctlError, JobId};
use herdctl_storage::{JobStoreError, SessionStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("agent {agent} already has {limit} running jobs")]
    ConcurrencyLimitExceeded { agent: String, limit: usize },

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("unknown agent {0:?}")]
    AgentNotFound(String),

    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error(transparent)]
    JobStore(#[from] JobStoreError),

    #[error(transparent)]
    SessionStore(#[from] SessionStoreError),

    #[error(transparent)]
    Runtime(#[from] HerdctlError),

    #[error("hook {name:?} failed: {message}")]
    Hook { name: String, message: String },
}

impl From<EngineError> for HerdctlError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ConcurrencyLimitExceeded { agent, limit } => {
                HerdctlError::ConcurrencyLimitExceeded { agent, limit }
            }
            EngineError::AgentNotFound(agent) => HerdctlError::Validation {
                issues: vec![herdctl_core::ValidationIssue {
                    field: "agent".to_string(),
                    message: format!("unknown agent {agent:?}"),
                    line: None,
                }],
            },
            EngineError::Runtime(herdctl) => herdctl,
            other => HerdctlError::StateStore {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
