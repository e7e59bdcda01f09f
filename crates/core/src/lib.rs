// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herdctl-core: shared data model, error taxonomy, and clock/id
//! abstractions for the fleet supervisor (§3 of the design).

pub mod agent;
pub mod clock;
pub mod error;
pub mod id;
pub mod job;
pub mod output;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod time_fmt;

pub use agent::{
    Agent, AgentDockerConfig, BashPermissions, DEFAULT_CONTAINER_IMAGE, DEFAULT_MEMORY_MB,
    FleetDockerConfig, HookBinding, HookBindings, McpServerDescriptor, NetworkMode,
    PermissionMode, Permissions, ResolvedDockerConfig, RuntimeKind, Schedule,
    SAFE_IDENTIFIER_PATTERN, SettingSource, Trigger, WorkspaceMode, is_safe_identifier,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{HerdctlError, ValidationIssue};
pub use id::{ContainerId, JobId, ShortId};
pub use job::{ExitReason, JobErrorDetail, JobMetadata, JobStatus, TriggerSource};
pub use output::{OutputRecord, TokenUsage};
pub use session::{default_ttl, SessionRecord, UsageCounters, SESSION_RECORD_VERSION};
#[cfg(any(test, feature = "test-support"))]
pub use test_support::test_agent;
pub use time_fmt::{format_elapsed, format_elapsed_ms};
