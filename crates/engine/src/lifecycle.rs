// SPDX-License-Identifier: MIT

//! The job lifecycle manager (§4.E): atomic job creation, the
//! pending→running→terminal state machine, concurrency limiting,
//! cancellation/timeout handling, final-output extraction, and
//! session persistence on clean completion only.

use crate::error::EngineError;
use futures_util::StreamExt;
use herdctl_core::{
    Agent, Clock, ExitReason, HerdctlError, JobErrorDetail, JobId, JobMetadata, OutputRecord,
    TriggerSource,
};
use herdctl_runtime::{BaseRuntimeFactory, CancellationToken, RuntimeOptions};
use herdctl_storage::{JobStore, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// One request to run a job to completion (§4.E `execute_job`).
pub struct ExecuteJobRequest {
    pub prompt: String,
    /// Key under which the session manager tracks resumption state for
    /// this job — typically the agent name for scheduled/triggered
    /// jobs, or a chat-platform-supplied key for conversational ones.
    pub conversation_key: String,
    pub timeout: Duration,
    pub cancellation: CancellationToken,
    /// Called once per output record as it is appended to the log, for
    /// the fleet supervisor's `job:message` event delivery (§4.G
    /// "trigger... return... an optional stream callback for
    /// message-by-message delivery"). The output log remains the
    /// authoritative order; this is a best-effort side channel.
    pub on_message: Option<Arc<dyn Fn(&OutputRecord) + Send + Sync>>,
}

impl ExecuteJobRequest {
    pub fn new(prompt: impl Into<String>, agent: &Agent) -> Self {
        Self {
            prompt: prompt.into(),
            conversation_key: agent.name.clone(),
            timeout: agent.default_timeout,
            cancellation: CancellationToken::new(),
            on_message: None,
        }
    }

    pub fn with_message_callback(mut self, callback: Arc<dyn Fn(&OutputRecord) + Send + Sync>) -> Self {
        self.on_message = Some(callback);
        self
    }
}

/// Owns job creation, execution, and the in-memory per-agent running
/// count that enforces `max_concurrent` (§4.E, §5).
pub struct JobLifecycleManager<C: Clock> {
    jobs: Arc<JobStore>,
    sessions: Arc<SessionStore<C>>,
    factory: Arc<dyn BaseRuntimeFactory>,
    clock: C,
    state_dir: std::path::PathBuf,
    running: Mutex<HashMap<String, usize>>,
}

impl<C: Clock> JobLifecycleManager<C> {
    pub fn new(
        jobs: Arc<JobStore>,
        sessions: Arc<SessionStore<C>>,
        factory: Arc<dyn BaseRuntimeFactory>,
        clock: C,
        state_dir: std::path::PathBuf,
    ) -> Self {
        Self {
            jobs,
            sessions,
            factory,
            clock,
            state_dir,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Write a fresh `pending` job record, failing with
    /// `ConcurrencyLimitExceeded` if the agent is already at its limit
    /// (§4.E `create_job`).
    pub async fn create_job(
        &self,
        agent: &Agent,
        trigger: TriggerSource,
    ) -> Result<JobMetadata, EngineError> {
        let mut running = self.running.lock().await;
        let count = running.get(&agent.name).copied().unwrap_or(0);
        if count >= agent.max_concurrent {
            return Err(EngineError::ConcurrencyLimitExceeded {
                agent: agent.name.clone(),
                limit: agent.max_concurrent,
            });
        }

        let now = self.clock.now();
        let job_id = JobId::generate_at(now);
        let metadata = JobMetadata::new_pending(
            job_id,
            agent.name.clone(),
            &trigger,
            agent.working_directory.clone(),
            now,
        );
        self.jobs.write_metadata(&metadata)?;
        *running.entry(agent.name.clone()).or_insert(0) += 1;
        info!(job_id = %metadata.id, agent = %agent.name, trigger = %trigger, "job created");
        Ok(metadata)
    }

    /// Run a `pending` job to completion: selects a runtime, consumes
    /// its output stream into the append-only log, and transitions the
    /// job to its terminal state (§4.E `execute_job`).
    pub async fn execute_job(
        &self,
        agent: &Agent,
        metadata: &mut JobMetadata,
        request: ExecuteJobRequest,
    ) -> Result<(), EngineError> {
        let start = self.clock.now();
        metadata.mark_running(start);
        self.jobs.write_metadata(metadata)?;

        let result = self.run_to_completion(agent, metadata, &request).await;
        let completed_at = self.clock.now();

        match result {
            Ok(session_id) => {
                metadata.mark_completed(completed_at, session_id.clone());
                if let Some(session_id) = session_id {
                    self.sessions.set(
                        &agent.name,
                        &request.conversation_key,
                        session_id,
                        Some(agent.working_directory.clone()),
                    )?;
                }
                info!(job_id = %metadata.id, "job completed");
            }
            Err((reason, detail)) => {
                warn!(job_id = %metadata.id, ?reason, "job did not complete cleanly");
                metadata.mark_failed(completed_at, reason, detail);
            }
        }

        self.jobs.write_metadata(metadata)?;
        let mut running = self.running.lock().await;
        if let Some(count) = running.get_mut(&agent.name) {
            *count = count.saturating_sub(1);
        }
        Ok(())
    }

    /// Consumes the runtime's stream and returns either the resolved
    /// external session id (clean completion, §4.E "only then") or a
    /// classified failure (§4.E "Error taxonomy").
    async fn run_to_completion(
        &self,
        agent: &Agent,
        metadata: &JobMetadata,
        request: &ExecuteJobRequest,
    ) -> Result<Option<String>, (ExitReason, Option<JobErrorDetail>)> {
        let resumed = self
            .sessions
            .resolve_for_resume(&agent.name, &request.conversation_key, &agent.working_directory)
            .map_err(|err| {
                (
                    ExitReason::Error,
                    Some(JobErrorDetail {
                        kind: "session_store".to_string(),
                        message: err.to_string(),
                        recoverable: None,
                    }),
                )
            })?;

        let mut options =
            RuntimeOptions::new(request.prompt.clone(), agent.clone(), self.state_dir.clone());
        options.cancellation = request.cancellation.clone();
        options = options.with_resume(resumed.external_session_id.clone());

        let runtime = self.factory.build_base(agent);
        let execution = runtime.execute(options).await.map_err(classify_runtime_error)?;
        let session_handle = execution.session_id.clone();
        let mut records = execution.records;

        let timeout_fired = tokio::select! {
            outcome = self.drain(metadata, &mut records, request.on_message.as_deref()) => {
                outcome?;
                false
            }
            _ = tokio::time::sleep(request.timeout) => {
                request.cancellation.cancel();
                // Drain whatever the runtime still emits (including the
                // terminal cancelled record) before declaring the job over.
                let _ = self.drain(metadata, &mut records, request.on_message.as_deref()).await;
                true
            }
        };

        if request.cancellation.is_cancelled() {
            let reason = if timeout_fired {
                ExitReason::Timeout
            } else {
                ExitReason::Cancelled
            };
            return Err((reason, None));
        }

        Ok(session_handle.lock().clone())
    }

    async fn drain(
        &self,
        metadata: &JobMetadata,
        records: &mut herdctl_runtime::OutputStream,
        on_message: Option<&(dyn Fn(&OutputRecord) + Send + Sync)>,
    ) -> Result<(), (ExitReason, Option<JobErrorDetail>)> {
        let job_id = JobId::from(metadata.id.as_str());
        while let Some(item) = records.next().await {
            match item {
                Ok(record) => {
                    if let Err(err) = self.jobs.append_output(&job_id, &record) {
                        return Err((
                            ExitReason::Error,
                            Some(JobErrorDetail {
                                kind: "job_store".to_string(),
                                message: err.to_string(),
                                recoverable: None,
                            }),
                        ));
                    }
                    if let Some(callback) = on_message {
                        callback(&record);
                    }
                }
                Err(err) => return Err(classify_runtime_error(err)),
            }
        }
        Ok(())
    }

    /// Select the final answer for retrieval APIs (§4.E
    /// "Final-output extraction"): the last non-partial `assistant`
    /// record; tool results are never the answer.
    pub fn final_output(&self, job_id: &JobId) -> Result<Option<String>, EngineError> {
        let records = self.jobs.read_output(job_id)?;
        Ok(records
            .iter()
            .rev()
            .find_map(|record| record.as_final_answer().map(str::to_string)))
    }
}

fn classify_runtime_error(err: HerdctlError) -> (ExitReason, Option<JobErrorDetail>) {
    let reason = match &err {
        HerdctlError::Cancelled => ExitReason::Cancelled,
        HerdctlError::Timeout { .. } => ExitReason::Timeout,
        _ => ExitReason::Error,
    };
    let detail = JobErrorDetail {
        kind: error_kind(&err),
        message: err.to_string(),
        recoverable: err.recoverable(),
    };
    (reason, Some(detail))
}

fn error_kind(err: &HerdctlError) -> String {
    match err {
        HerdctlError::Validation { .. } => "validation",
        HerdctlError::PathTraversal { .. } => "path_traversal",
        HerdctlError::ConcurrencyLimitExceeded { .. } => "concurrency_limit_exceeded",
        HerdctlError::RuntimeInitialization { .. } => "runtime_initialization",
        HerdctlError::RuntimeStreaming { .. } => "runtime_streaming",
        HerdctlError::RuntimeMalformedResponse { .. } => "runtime_malformed_response",
        HerdctlError::Docker { .. } => "docker",
        HerdctlError::Timeout { .. } => "timeout",
        HerdctlError::Cancelled => "cancelled",
        HerdctlError::StateStore { .. } => "state_store",
        HerdctlError::SessionStale { .. } => "session_stale",
    }
    .to_string()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
