// SPDX-License-Identifier: MIT

//! The fleet supervisor (§4.G): the single owner of a fleet's agents,
//! state directory, schedule engine, and event channel. Everything
//! else in this crate (config loading, the runtime factory, hooks) is
//! assembled here into one running daemon.

use crate::events::{FleetEvent, EVENT_CHANNEL_CAPACITY};
use chrono::Utc;
use herdctl_core::{
    Agent, Clock, HerdctlError, JobId, JobMetadata, JobStatus, OutputRecord, TriggerSource,
};
use herdctl_engine::{
    run_bindings, EngineError, ExecuteJobRequest, HookContext, HookRunner, JobLifecycleManager,
    ScheduleEngine,
};
use herdctl_runtime::CancellationToken;
use herdctl_storage::{SessionStoreError, StateStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Result of a [`FleetSupervisor::cancel`] call (§4.G `cancel`, §8
/// idempotence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was running and has been signalled to stop.
    Cancelled,
    /// The job was not running — already completed, failed, or unknown
    /// to this supervisor. No action was taken.
    AlreadyTerminal,
}

/// A view over the jobs currently known to the supervisor, used by
/// `list_jobs` (§4.G).
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub agent: Option<String>,
    pub status: Option<JobStatus>,
}

/// Runs the tick loop and owns every in-flight job's cancellation
/// token so `cancel(job_id)` can reach it (§4.G `cancel`).
pub struct FleetSupervisor<C: Clock> {
    agents: HashMap<String, Agent>,
    state: Arc<StateStore<C>>,
    lifecycle: Arc<JobLifecycleManager<C>>,
    schedule: Mutex<ScheduleEngine>,
    clock: C,
    events: broadcast::Sender<FleetEvent>,
    hooks: Option<Arc<dyn HookRunner>>,
    running: Mutex<HashMap<String, CancellationToken>>,
    tick_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock> FleetSupervisor<C> {
    /// Build a supervisor over an already-open state directory and an
    /// already-resolved fleet. Does not start the tick loop — call
    /// [`Self::start`] for that (§4.G "start: open the state
    /// directory... begin the tick loop").
    pub fn new(
        agents: Vec<Agent>,
        state: Arc<StateStore<C>>,
        lifecycle: Arc<JobLifecycleManager<C>>,
        clock: C,
        hooks: Option<Arc<dyn HookRunner>>,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            agents: agents.into_iter().map(|a| (a.name.clone(), a)).collect(),
            state,
            lifecycle,
            schedule: Mutex::new(ScheduleEngine::new(clock.now())),
            clock,
            events: tx,
            hooks,
            running: Mutex::new(HashMap::new()),
            tick_handle: Mutex::new(None),
        }
    }

    /// Subscribe to the fleet's typed event stream (§4.G). A
    /// subscriber that falls behind observes `RecvError::Lagged`
    /// rather than stalling the fleet (§5).
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: FleetEvent) {
        // No subscribers is the ordinary case for a freshly started
        // daemon; `send` failing here is not itself an error.
        let _ = self.events.send(event);
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Clear expired sessions, then spawn the periodic tick loop that
    /// drives the schedule engine (§4.G `start`). Returns immediately;
    /// the loop runs on its own task until [`Self::stop`] aborts it.
    pub fn start(self: &Arc<Self>, tick_interval: std::time::Duration) -> Result<(), HerdctlError> {
        self.state
            .sessions
            .cleanup_expired()
            .map_err(session_store_error)?;

        let supervisor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            loop {
                interval.tick().await;
                if let Err(err) = supervisor.tick().await {
                    warn!(error = %err, "schedule tick failed");
                }
            }
        });
        *self.tick_handle.lock() = Some(handle);
        info!("fleet supervisor started");
        Ok(())
    }

    /// Abort the tick loop. In-flight jobs are left to finish or time
    /// out on their own; this only stops new schedule-driven jobs from
    /// being created (§4.G `stop`).
    pub fn stop(&self) {
        if let Some(handle) = self.tick_handle.lock().take() {
            handle.abort();
        }
        info!("fleet supervisor stopped");
    }

    /// Run one schedule tick: every due, enabled schedule across every
    /// agent attempts to create a job (§4.F, §4.G).
    async fn tick(self: &Arc<Self>) -> Result<(), EngineError> {
        let now = self.clock.now();
        let agents: Vec<Agent> = self.agents.values().cloned().collect();
        let mut due = Vec::new();
        self.schedule.lock().tick(&agents, now, |agent, schedule| {
            due.push((agent.name.clone(), schedule.name.clone()));
            true
        })?;

        for (agent_name, schedule_name) in due {
            let Some(agent) = self.agents.get(&agent_name) else {
                continue;
            };
            let prompt = agent
                .schedules
                .iter()
                .find(|s| s.name == schedule_name)
                .and_then(|s| s.prompt.clone())
                .or_else(|| agent.default_prompt.clone())
                .unwrap_or_default();

            let supervisor = Arc::clone(self);
            let agent = agent.clone();
            tokio::spawn(async move {
                if let Err(err) = supervisor
                    .trigger(&agent.name, Some(schedule_name.clone()), prompt)
                    .await
                {
                    warn!(agent = %agent.name, schedule = %schedule_name, error = %err, "scheduled job failed to start");
                }
            });
        }
        Ok(())
    }

    /// Create and run a job for `agent_name`, optionally attributed to
    /// a named schedule (`None` means a manual trigger) (§4.G
    /// `trigger`).
    pub async fn trigger(
        self: &Arc<Self>,
        agent_name: &str,
        schedule_name: Option<String>,
        prompt: impl Into<String>,
    ) -> Result<JobId, EngineError> {
        let agent = self
            .agents
            .get(agent_name)
            .cloned()
            .ok_or_else(|| EngineError::AgentNotFound(agent_name.to_string()))?;

        let trigger_source = match &schedule_name {
            Some(name) => TriggerSource::Schedule(name.clone()),
            None => TriggerSource::Manual,
        };

        let metadata = self.lifecycle.create_job(&agent, trigger_source).await?;
        self.emit(FleetEvent::JobCreated {
            job: metadata.clone(),
        });

        let job_id = JobId::from(metadata.id.as_str());
        let cancellation = CancellationToken::new();
        self.running
            .lock()
            .insert(metadata.id.clone(), cancellation.clone());

        let supervisor = Arc::clone(self);
        let agent_for_task = agent.clone();
        let job_id_for_task = job_id.clone();
        tokio::spawn(async move {
            supervisor
                .run_job(agent_for_task, metadata, cancellation, prompt.into())
                .await;
            supervisor.running.lock().remove(job_id_for_task.as_str());
        });

        Ok(job_id)
    }

    async fn run_job(
        self: &Arc<Self>,
        agent: Agent,
        mut metadata: JobMetadata,
        cancellation: CancellationToken,
        prompt: String,
    ) {
        self.emit(FleetEvent::JobStarted {
            job: metadata.clone(),
        });

        let job_id_for_events = metadata.id.clone();
        let events = self.events.clone();
        let on_message: Arc<dyn Fn(&OutputRecord) + Send + Sync> = Arc::new(move |record| {
            let _ = events.send(FleetEvent::JobMessage {
                job_id: job_id_for_events.clone(),
                record: record.clone(),
            });
        });

        let mut request = ExecuteJobRequest::new(prompt, &agent).with_message_callback(on_message);
        request.cancellation = cancellation;

        let result = self
            .lifecycle
            .execute_job(&agent, &mut metadata, request)
            .await;

        if let Err(err) = result {
            warn!(job_id = %metadata.id, error = %err, "job execution bookkeeping failed");
        }

        let event = match metadata.status {
            JobStatus::Completed => FleetEvent::JobCompleted {
                job: metadata.clone(),
            },
            JobStatus::Timeout => FleetEvent::JobTimeout {
                job: metadata.clone(),
            },
            JobStatus::Cancelled => FleetEvent::JobCancelled {
                job: metadata.clone(),
            },
            _ => FleetEvent::JobFailed {
                job: metadata.clone(),
            },
        };
        self.emit(event);

        self.run_hooks(&agent, &metadata).await;
    }

    async fn run_hooks(&self, agent: &Agent, metadata: &JobMetadata) {
        let Some(runner) = &self.hooks else {
            return;
        };
        let event = if metadata.status == JobStatus::Completed {
            "after_run"
        } else {
            "on_error"
        };
        let bindings = if metadata.status == JobStatus::Completed {
            &agent.hooks.after_run
        } else {
            &agent.hooks.on_error
        };
        let context = HookContext {
            job: metadata.clone(),
            agent_name: agent.name.clone(),
            event: event.to_string(),
        };
        let outcomes = run_bindings(runner.as_ref(), bindings, &context).await;
        for outcome in outcomes {
            if !outcome.succeeded {
                warn!(
                    job_id = %metadata.id,
                    hook = %outcome.binding_name,
                    detail = outcome.detail.as_deref().unwrap_or(""),
                    "hook did not succeed"
                );
            }
        }
    }

    /// Request cancellation of a running job. Idempotent: cancelling a
    /// job that already finished (or was never started) is a no-op, not
    /// an error, and is reported back as [`CancelOutcome::AlreadyTerminal`]
    /// so callers can distinguish it from an actual cancellation (§8
    /// "cancel(job-id) for an already-terminal job is a no-op with a
    /// clear 'already terminal' response").
    pub fn cancel(&self, job_id: &JobId) -> CancelOutcome {
        match self.running.lock().get(job_id.as_str()) {
            Some(token) => {
                token.cancel();
                CancelOutcome::Cancelled
            }
            None => CancelOutcome::AlreadyTerminal,
        }
    }

    /// Signal cancellation to every currently-running job (§4.G
    /// `stop` — "signal cancellation to all running jobs, wait up to
    /// a bounded grace period, then force-terminate"). Pair with
    /// [`Self::wait_for_idle`] for the grace-period wait.
    pub fn cancel_all(&self) {
        for token in self.running.lock().values() {
            token.cancel();
        }
    }

    /// Current status of every agent this supervisor manages, or one
    /// agent when `agent_name` is given (§4.G `status`).
    pub fn status(&self, agent_name: Option<&str>) -> Vec<&Agent> {
        match agent_name {
            Some(name) => self.agents.get(name).into_iter().collect(),
            None => self.agents.values().collect(),
        }
    }

    pub fn get_job(&self, job_id: &JobId) -> Result<Option<JobMetadata>, EngineError> {
        Ok(self.state.jobs.read_metadata(job_id)?)
    }

    /// List job metadata across every tracked job, filtered and newest
    /// first (§4.G `list_jobs`).
    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobMetadata>, EngineError> {
        let mut jobs = Vec::new();
        for id in self.state.jobs.list_job_ids().map_err(|source| {
            EngineError::JobStore(herdctl_storage::JobStoreError::Io(
                herdctl_storage::AtomicIoError::Read {
                    path: self.state.root().join("jobs"),
                    source,
                },
            ))
        })? {
            let job_id = JobId::from(id.as_str());
            let Some(metadata) = self.state.jobs.read_metadata(&job_id)? else {
                continue;
            };
            if let Some(agent) = &filter.agent {
                if &metadata.agent_name != agent {
                    continue;
                }
            }
            if let Some(status) = filter.status {
                if metadata.status != status {
                    continue;
                }
            }
            jobs.push(metadata);
        }
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    pub fn get_job_final_output(&self, job_id: &JobId) -> Result<Option<String>, EngineError> {
        self.lifecycle.final_output(job_id)
    }

    pub fn read_output(&self, job_id: &JobId) -> Result<Vec<OutputRecord>, EngineError> {
        Ok(self.state.jobs.read_output(job_id)?)
    }

    /// List the live (non-expired) session count per agent (§4.G
    /// `list_sessions`).
    pub fn list_sessions(&self) -> Result<HashMap<String, usize>, EngineError> {
        let mut counts = HashMap::new();
        for name in self.agents.keys() {
            let count = self
                .state
                .sessions
                .active_count(name)
                .map_err(session_store_to_engine)?;
            counts.insert(name.clone(), count);
        }
        Ok(counts)
    }

    /// Explicitly resume a conversation key's session, emitting
    /// `SessionResumed` (§4.G `resume_session`). A no-op that emits
    /// nothing if there is no existing record.
    pub fn resume_session(
        &self,
        agent_name: &str,
        conversation_key: &str,
    ) -> Result<Option<String>, EngineError> {
        let record = self
            .state
            .sessions
            .get(agent_name, conversation_key)
            .map_err(session_store_to_engine)?;
        if let Some(record) = &record {
            self.emit(FleetEvent::SessionResumed {
                agent: agent_name.to_string(),
                conversation_key: conversation_key.to_string(),
                session_id: record.external_session_id.clone(),
            });
        }
        Ok(record.map(|r| r.external_session_id))
    }

    /// Clear a conversation key's session mapping, emitting
    /// `SessionCleared` (§4.H `clear_session`).
    pub fn clear_session(
        &self,
        agent_name: &str,
        conversation_key: &str,
    ) -> Result<(), EngineError> {
        self.state
            .sessions
            .clear(agent_name, conversation_key)
            .map_err(session_store_to_engine)?;
        self.emit(FleetEvent::SessionCleared {
            agent: agent_name.to_string(),
            conversation_key: conversation_key.to_string(),
        });
        Ok(())
    }

    /// Remove completed/failed/timed-out/cancelled jobs older than
    /// `older_than` (§4.B "Job pruning"). An explicit maintenance
    /// action, never run implicitly.
    pub fn prune_jobs(
        &self,
        older_than: chrono::DateTime<Utc>,
    ) -> Result<Vec<JobId>, EngineError> {
        Ok(self.state.prune_jobs(older_than, None)?)
    }

    /// Poll until no job is tracked as running, used by graceful
    /// shutdown paths that want to drain before exiting. Does not
    /// cancel anything itself; pair with `cancel` for every running
    /// job first if a hard deadline matters more than letting jobs
    /// finish naturally.
    pub async fn wait_for_idle(&self) {
        loop {
            if self.running.lock().is_empty() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }
}

fn session_store_error(err: SessionStoreError) -> HerdctlError {
    HerdctlError::StateStore {
        message: err.to_string(),
    }
}

fn session_store_to_engine(err: SessionStoreError) -> EngineError {
    EngineError::SessionStore(err)
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
