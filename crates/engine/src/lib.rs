// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herdctl-engine: the job lifecycle manager (§4.E) and the schedule
//! engine (§4.F) that together turn a fleet of [`herdctl_core::Agent`]
//! configs and a tick into running jobs, plus the hook-invocation
//! surface (§9) the daemon fires on terminal job transitions.

pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod schedule;

pub use error::EngineError;
pub use hooks::{agent_label, run_bindings, HookContext, HookOutcome, HookRunner};
pub use lifecycle::{ExecuteJobRequest, JobLifecycleManager};
pub use schedule::{next_occurrence, ScheduleEngine};
