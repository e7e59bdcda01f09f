// SPDX-License-Identifier: MIT

//! Selects a base runtime (SDK or CLI) for an agent (§4.C "Runtime
//! factory"). Container wrapping is layered on top of this by
//! `herdctl-container`, which only needs a [`BaseRuntimeFactory`] to
//! build the runtime it decorates.

use crate::cli::CliRunner;
use crate::runtime::Runtime;
use crate::sdk::{SdkClient, SdkRunner};
use herdctl_core::{Agent, Clock, RuntimeKind};
use std::sync::Arc;

/// Builds the base (undecorated) runtime for an agent. Implemented by
/// [`RuntimeFactory`]; exists as a trait so `herdctl-container` can wrap
/// any implementation without depending on its generic parameters.
pub trait BaseRuntimeFactory: Send + Sync {
    fn build_base(&self, agent: &Agent) -> Arc<dyn Runtime>;
}

/// Picks [`SdkRunner`] or [`CliRunner`] based on [`Agent::runtime`]
/// (§4.C). `RuntimeKind` is a closed two-variant enum, so selection
/// never fails here; a third backend would be rejected by the config
/// loader's schema before it ever reached this factory.
pub struct RuntimeFactory<C, K> {
    sdk_client: Arc<C>,
    clock: K,
}

impl<C, K> RuntimeFactory<C, K>
where
    C: SdkClient + 'static,
    K: Clock,
{
    pub fn new(sdk_client: Arc<C>, clock: K) -> Self {
        Self { sdk_client, clock }
    }
}

impl<C, K> BaseRuntimeFactory for RuntimeFactory<C, K>
where
    C: SdkClient + 'static,
    K: Clock,
{
    fn build_base(&self, agent: &Agent) -> Arc<dyn Runtime> {
        match &agent.runtime {
            RuntimeKind::Sdk => {
                Arc::new(SdkRunner::new(self.sdk_client.clone(), self.clock.clone()))
            }
            RuntimeKind::Cli { .. } => Arc::new(CliRunner::new()),
        }
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
