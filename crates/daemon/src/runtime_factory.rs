// SPDX-License-Identifier: MIT

//! The full runtime factory (§4.C "Runtime factory"): composes the
//! base SDK/CLI selection in `herdctl-runtime` with the Docker
//! decorator in `herdctl-container`. This composition lives here,
//! rather than in either of those crates, because only the daemon
//! holds the connected [`ContainerManager`] (a daemon-lifetime
//! resource per §4.D, §9 "Global state") that the decorator needs.

use async_trait::async_trait;
use herdctl_container::ContainerRunner;
use herdctl_core::{Agent, HerdctlError};
use herdctl_runtime::{BaseRuntimeFactory, Runtime, RuntimeExecution, RuntimeOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Wraps any [`BaseRuntimeFactory`] so agents with `docker.enabled`
/// run inside a container instead of directly on the host (§4.C: "If
/// container configuration is `enabled`, the factory wraps the
/// selected base runtime with the container decorator. Otherwise it
/// returns the base runtime directly.").
pub struct FullRuntimeFactory<F> {
    base: F,
    container: Option<Arc<herdctl_container::ContainerManager>>,
    auth_dir: Option<PathBuf>,
}

impl<F: BaseRuntimeFactory> FullRuntimeFactory<F> {
    pub fn new(
        base: F,
        container: Option<Arc<herdctl_container::ContainerManager>>,
        auth_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            base,
            container,
            auth_dir,
        }
    }
}

impl<F: BaseRuntimeFactory> BaseRuntimeFactory for FullRuntimeFactory<F> {
    fn build_base(&self, agent: &Agent) -> Arc<dyn Runtime> {
        if !agent.docker.enabled {
            return self.base.build_base(agent);
        }
        match &self.container {
            Some(manager) => Arc::new(ContainerRunner::new(manager.clone(), self.auth_dir.clone())),
            None => Arc::new(DockerUnavailableRuntime),
        }
    }
}

/// Stands in for a container runtime when the agent requests
/// `docker.enabled` but the daemon never connected to a Docker daemon
/// (e.g. `DOCKER_HOST` unset and no local socket). Failing here keeps
/// the failure inside the ordinary job-failure path (`RuntimeDocker`
/// error, job transitions to `failed`) instead of panicking deep
/// inside the container crate.
struct DockerUnavailableRuntime;

#[async_trait]
impl Runtime for DockerUnavailableRuntime {
    async fn execute(&self, _options: RuntimeOptions) -> Result<RuntimeExecution, HerdctlError> {
        Err(HerdctlError::Docker {
            message: "agent requires docker but no docker daemon connection is available"
                .to_string(),
            recoverable: false,
        })
    }
}

#[cfg(test)]
#[path = "runtime_factory_tests.rs"]
mod tests;
