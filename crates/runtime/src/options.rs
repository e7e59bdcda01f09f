// SPDX-License-Identifier: MIT

//! `RuntimeOptions` — everything a runtime needs to execute one job
//! (§4.C).

use crate::cancellation::CancellationToken;
use herdctl_core::Agent;
use std::path::PathBuf;

/// Declares an MCP-style tool server to inject into the run, beyond
/// whatever the agent's own configuration already names.
#[derive(Debug, Clone)]
pub struct ExtensionServer {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

/// Inputs to `Runtime::execute` (§4.C).
///
/// `resume_session_id` and `fork_session_id` are mutually exclusive —
/// resuming continues an existing external session in place; forking
/// starts a new external session seeded from an existing one's
/// transcript. [`RuntimeOptions::validate`] enforces this.
#[derive(Clone)]
pub struct RuntimeOptions {
    pub prompt: String,
    pub agent: Agent,
    pub resume_session_id: Option<String>,
    pub fork_session_id: Option<String>,
    pub cancellation: CancellationToken,
    pub state_dir: PathBuf,
    pub extension_servers: Vec<ExtensionServer>,
}

#[derive(Debug, thiserror::Error)]
#[error("resume_session_id and fork_session_id are mutually exclusive")]
pub struct ConflictingSessionModeError;

impl RuntimeOptions {
    pub fn new(prompt: impl Into<String>, agent: Agent, state_dir: PathBuf) -> Self {
        Self {
            prompt: prompt.into(),
            agent,
            resume_session_id: None,
            fork_session_id: None,
            cancellation: CancellationToken::new(),
            state_dir,
            extension_servers: Vec::new(),
        }
    }

    pub fn with_resume(mut self, session_id: impl Into<String>) -> Self {
        self.resume_session_id = Some(session_id.into());
        self
    }

    pub fn with_fork(mut self, session_id: impl Into<String>) -> Self {
        self.fork_session_id = Some(session_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConflictingSessionModeError> {
        if self.resume_session_id.is_some() && self.fork_session_id.is_some() {
            Err(ConflictingSessionModeError)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
