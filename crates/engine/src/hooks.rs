// SPDX-License-Identifier: MIT

//! Hook invocation surface (§9: "hooks receive a context object
//! containing the final job record and the agent metadata"). Concrete
//! hook backends (shell, webhook, notification) are out of core per
//! §1; this module only defines what the lifecycle manager hands them
//! and the trait it invokes against.

use herdctl_core::{Agent, HookBinding, JobMetadata};
use std::time::Duration;

/// Everything a hook backend needs to decide whether/how to fire
/// (§9). Built once per terminal job transition and handed to every
/// matching [`HookBinding`].
#[derive(Debug, Clone)]
pub struct HookContext {
    pub job: JobMetadata,
    pub agent_name: String,
    pub event: String,
}

/// The outcome of one hook invocation, used to decide whether a
/// failure should abort the remaining bindings (`continue_on_error`).
#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub binding_name: String,
    pub succeeded: bool,
    pub detail: Option<String>,
}

/// Implemented by whatever concrete hook backend the daemon wires up
/// (shell command, webhook POST, chat notification). The lifecycle
/// manager only depends on this trait, never a concrete backend (§1,
/// §9).
#[async_trait::async_trait]
pub trait HookRunner: Send + Sync {
    async fn run(&self, binding: &HookBinding, context: &HookContext) -> HookOutcome;
}

/// Runs every binding in `bindings` against `context` in order,
/// bounding each invocation by its own `timeout_secs` and stopping
/// early only for a binding with `continue_on_error = false` (§6, §9).
pub async fn run_bindings(
    runner: &dyn HookRunner,
    bindings: &[HookBinding],
    context: &HookContext,
) -> Vec<HookOutcome> {
    let mut outcomes = Vec::with_capacity(bindings.len());
    for binding in bindings {
        if !predicate_matches(binding, context) {
            continue;
        }
        let outcome = match tokio::time::timeout(binding.timeout(), runner.run(binding, context)).await {
            Ok(outcome) => outcome,
            Err(_) => HookOutcome {
                binding_name: binding.name.clone(),
                succeeded: false,
                detail: Some(format!(
                    "timed out after {}s",
                    Duration::as_secs(&binding.timeout())
                )),
            },
        };
        let should_stop = !outcome.succeeded && !binding.continue_on_error;
        outcomes.push(outcome);
        if should_stop {
            break;
        }
    }
    outcomes
}

/// Evaluate a hook binding's `when` predicate against the job outcome.
/// Only the one dot-path expression this system names is supported:
/// `job.exit_reason == "<value>"` (§6, §9). Anything else, including
/// no predicate at all, always matches.
fn predicate_matches(binding: &HookBinding, context: &HookContext) -> bool {
    if !binding.on_events.is_empty() && !binding.on_events.iter().any(|e| e == &context.event) {
        return false;
    }
    let Some(when) = &binding.when else {
        return true;
    };
    let Some((path, expected)) = when.split_once("==") else {
        return true;
    };
    let path = path.trim();
    let expected = expected.trim().trim_matches('"');
    if path == "job.exit_reason" {
        let actual = context
            .job
            .exit_reason
            .map(|reason| format!("{reason:?}").to_lowercase());
        actual.as_deref() == Some(expected)
    } else {
        true
    }
}

/// Used only to keep [`HookContext`] honest about carrying agent
/// metadata without forcing every hook backend to depend on
/// `herdctl_core::Agent` directly.
pub fn agent_label(agent: &Agent) -> String {
    agent.name.clone()
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
