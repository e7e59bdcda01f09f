// SPDX-License-Identifier: MIT

use super::*;
use herdctl_core::test_agent;
use herdctl_runtime::{BaseRuntimeFactory, RuntimeOptions};

struct StubBaseFactory;

impl BaseRuntimeFactory for StubBaseFactory {
    fn build_base(&self, _agent: &Agent) -> Arc<dyn Runtime> {
        Arc::new(StubRuntime)
    }
}

struct StubRuntime;

#[async_trait::async_trait]
impl Runtime for StubRuntime {
    async fn execute(&self, _options: RuntimeOptions) -> Result<RuntimeExecution, HerdctlError> {
        Err(HerdctlError::Cancelled)
    }
}

#[tokio::test]
async fn non_docker_agent_uses_base_factory_directly() {
    let factory = FullRuntimeFactory::new(StubBaseFactory, None, None);
    let mut agent = test_agent("plain");
    agent.docker.enabled = false;
    let runtime = factory.build_base(&agent);
    let state_dir = tempfile::tempdir().unwrap();
    let options = RuntimeOptions::new("hi", agent, state_dir.path().to_path_buf());
    // The stub always fails with Cancelled, distinguishing it from the
    // container-unavailable error the docker path would produce.
    let err = runtime.execute(options).await.unwrap_err();
    assert!(matches!(err, HerdctlError::Cancelled));
}

#[tokio::test]
async fn docker_enabled_without_manager_fails_at_execution_not_factory_time() {
    let factory = FullRuntimeFactory::new(StubBaseFactory, None, None);
    let mut agent = test_agent("dockerized");
    agent.docker.enabled = true;
    let runtime = factory.build_base(&agent);
    let state_dir = tempfile::tempdir().unwrap();
    let options = RuntimeOptions::new("hi", agent, state_dir.path().to_path_buf());
    let err = runtime.execute(options).await.unwrap_err();
    assert!(matches!(err, HerdctlError::Docker { .. }));
}
