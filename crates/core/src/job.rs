// SPDX-License-Identifier: MIT

//! Job identity, state machine, and metadata record (§3, §4.E, §6).

use crate::id::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Job status state machine (§3, §4.E). Transitions are one-way:
/// `pending -> running -> {completed, failed, timeout, cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Timeout | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Timeout => "timeout",
            JobStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Deterministic exit-reason classification (§4.E, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Success,
    Error,
    Timeout,
    Cancelled,
    MaxTurns,
}

/// Non-fatal detail attached to a failed/timed-out job (§6 metadata format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobErrorDetail {
    pub kind: String,
    pub message: String,
    pub recoverable: Option<bool>,
}

/// Where a job came from: a named schedule, a manual trigger, an explicit
/// programmatic trigger, or a chat-platform tag (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Schedule(String),
    Manual,
    Trigger,
    Chat(String),
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::Schedule(name) => write!(f, "{name}"),
            TriggerSource::Manual => write!(f, "manual"),
            TriggerSource::Trigger => write!(f, "trigger"),
            TriggerSource::Chat(tag) => write!(f, "{tag}"),
        }
    }
}

/// The on-disk job metadata record (§3, §6). Written as YAML under
/// `<state>/jobs/<job-id>/metadata.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    pub id: String,
    pub agent_name: String,
    pub schedule_name: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
    pub exit_reason: Option<ExitReason>,
    pub error: Option<JobErrorDetail>,
    pub container_id: Option<String>,
    pub working_directory: PathBuf,
}

impl JobMetadata {
    /// A brand-new job record in `pending` status (§4.E `create_job`).
    pub fn new_pending(
        id: JobId,
        agent_name: impl Into<String>,
        trigger: &TriggerSource,
        working_directory: PathBuf,
        created_at: DateTime<Utc>,
    ) -> Self {
        let schedule_name = match trigger {
            TriggerSource::Schedule(name) => Some(name.clone()),
            TriggerSource::Manual => Some("manual".to_string()),
            TriggerSource::Trigger => Some("trigger".to_string()),
            TriggerSource::Chat(tag) => Some(tag.clone()),
        };
        Self {
            id: id.as_str().to_string(),
            agent_name: agent_name.into(),
            schedule_name,
            status: JobStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            session_id: None,
            exit_reason: None,
            error: None,
            container_id: None,
            working_directory,
        }
    }

    pub fn mark_running(&mut self, started_at: DateTime<Utc>) {
        self.status = JobStatus::Running;
        self.started_at = Some(started_at);
    }

    pub fn mark_completed(&mut self, completed_at: DateTime<Utc>, session_id: Option<String>) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(completed_at);
        self.exit_reason = Some(ExitReason::Success);
        // Session id is only persisted for clean completion (§3 invariant,
        // §4.E "only then so failed jobs do not accumulate stale ids").
        self.session_id = session_id;
    }

    pub fn mark_failed(
        &mut self,
        completed_at: DateTime<Utc>,
        reason: ExitReason,
        error: Option<JobErrorDetail>,
    ) {
        self.status = match reason {
            ExitReason::Timeout => JobStatus::Timeout,
            ExitReason::Cancelled => JobStatus::Cancelled,
            _ => JobStatus::Failed,
        };
        self.completed_at = Some(completed_at);
        self.exit_reason = Some(reason);
        self.error = error;
        // §8 invariant 7: no session id is ever set on a cancelled/failed job.
        self.session_id = None;
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
