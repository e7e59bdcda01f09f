// SPDX-License-Identifier: MIT

//! The container-wrapped [`Runtime`] (§4.D): re-expresses a job as an
//! equivalent command invocation inside a Docker container instead of
//! calling the wrapped runtime's `execute` directly, then demultiplexes
//! the collected output through the same `stream-json` parsing logic
//! the CLI runner uses.

use crate::manager::ContainerManager;
use async_trait::async_trait;
use futures_util::stream;
use herdctl_core::{HerdctlError, OutputRecord};
use herdctl_runtime::cli::{cli_args, stdout_parser, DEFAULT_CLI_COMMAND};
use herdctl_runtime::{OutputStream, Runtime, RuntimeExecution, RuntimeOptions};
use std::sync::Arc;

/// Runs a job inside a Docker container by `exec`-ing the CLI command
/// that the [`herdctl_runtime::cli`] runner would otherwise spawn
/// directly on the host (§4.D).
pub struct ContainerRunner {
    manager: Arc<ContainerManager>,
    auth_dir: Option<std::path::PathBuf>,
}

impl ContainerRunner {
    pub fn new(manager: Arc<ContainerManager>, auth_dir: Option<std::path::PathBuf>) -> Self {
        Self { manager, auth_dir }
    }

    fn container_name(options: &RuntimeOptions) -> String {
        if options.agent.docker.ephemeral {
            format!("herdctl-{}-{}", options.agent.name, uuid::Uuid::new_v4())
        } else {
            format!("herdctl-{}", options.agent.name)
        }
    }

    fn command_name(options: &RuntimeOptions) -> String {
        match &options.agent.runtime {
            herdctl_core::RuntimeKind::Cli {
                command: Some(command),
            } => command.clone(),
            _ => DEFAULT_CLI_COMMAND.to_string(),
        }
    }
}

#[async_trait]
impl Runtime for ContainerRunner {
    async fn execute(&self, options: RuntimeOptions) -> Result<RuntimeExecution, HerdctlError> {
        options
            .validate()
            .map_err(|err| HerdctlError::RuntimeInitialization {
                message: err.to_string(),
                recoverable: false,
            })?;

        let container_name = Self::container_name(&options);
        let docker_id = self
            .manager
            .provision(&options.agent, &container_name, self.auth_dir.as_deref())
            .await?;

        let mut command = vec![Self::command_name(&options)];
        command.extend(cli_args(&options));
        command.push(options.prompt.clone());

        // The exec itself can't be interrupted mid-flight through
        // bollard; racing it against the cancellation token and force
        // -tearing-down the container on cancellation is this
        // runtime's equivalent of the CLI runner's kill-on-cancel
        // select loop (§5 "Cancellation semantics").
        let cancellation = options.cancellation.clone();
        let exec_result = tokio::select! {
            result = self.manager.exec(&docker_id, command) => Some(result),
            _ = cancellation.cancelled() => None,
        };

        let exec_result = match exec_result {
            Some(result) => result,
            None => {
                if let Err(err) = self.manager.teardown(&docker_id).await {
                    tracing::warn!(container_id = %docker_id, error = %err, "failed to tear down cancelled container");
                }
                return Ok(RuntimeExecution::new(
                    Box::pin(stream::once(async { Err(HerdctlError::Cancelled) })) as OutputStream,
                ));
            }
        };

        if options.agent.docker.ephemeral {
            if let Err(err) = self.manager.teardown(&docker_id).await {
                tracing::warn!(container_id = %docker_id, error = %err, "failed to tear down ephemeral container");
            }
        }

        let output = exec_result?;
        let now = chrono::Utc::now();
        let mut session_id = None;
        let mut records = Vec::new();
        for line in output.lines() {
            if session_id.is_none() {
                session_id = stdout_parser::extract_session_id(line);
            }
            records.extend(stdout_parser::parse_line(line, now).into_iter().map(Ok));
        }

        let execution = RuntimeExecution::new(Box::pin(stream::iter(records)) as OutputStream);
        if let Some(id) = session_id {
            *execution.session_id.lock() = Some(id);
        }
        Ok(execution)
    }
}

#[cfg(test)]
#[path = "decorator_tests.rs"]
mod tests;
