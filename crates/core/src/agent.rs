// SPDX-License-Identifier: MIT

//! The resolved agent configuration (§3 "Agent (resolved)", §6 "Agent
//! configuration surface"). This is the type the loader hands to the
//! fleet supervisor; it is immutable for the duration of a job.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Pattern every agent name, schedule name, and job id component must
/// satisfy before any file path is built from it (§3, §4.A).
pub const SAFE_IDENTIFIER_PATTERN: &str = "^[A-Za-z0-9][A-Za-z0-9_-]*$";

/// Check an identifier against [`SAFE_IDENTIFIER_PATTERN`] without pulling
/// in a regex engine for a pattern this small and fixed.
pub fn is_safe_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Which backend runs the agent's prompts (§4.C).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeKind {
    /// In-process SDK client.
    Sdk,
    /// External CLI subprocess, default command `claude -p`.
    Cli {
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
}

impl Default for RuntimeKind {
    fn default() -> Self {
        RuntimeKind::Sdk
    }
}

/// Permission mode names and effects are fixed by the spec (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    Default,
    AcceptEdits,
    BypassPermissions,
    Plan,
    Delegate,
    DontAsk,
}

impl Default for PermissionMode {
    fn default() -> Self {
        PermissionMode::AcceptEdits
    }
}

/// Bash-tool argument restrictions (§6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BashPermissions {
    pub allowed_commands: Vec<String>,
    pub denied_patterns: Vec<String>,
}

/// Tool allow/deny lists and the bash-specific sub-restrictions (§6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Permissions {
    pub mode: PermissionMode,
    pub allowed_tools: Vec<String>,
    pub denied_tools: Vec<String>,
    pub bash: BashPermissions,
}

// manual Default for PermissionMode field above requires PermissionMode: Default, already provided.

/// How an external-extension (MCP) server is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum McpServerDescriptor {
    Process {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    Http {
        url: String,
    },
}

/// `setting_sources` entries (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingSource {
    Project,
    Local,
}

/// Agent-level Docker config — the "safe subset" (§6). Fields that are
/// fleet-level-only (`image`, `network`, `volumes`, `user`, `ports`,
/// `env`, `host_config`) are deliberately absent from this struct; the
/// config loader rejects them by name if present (§8 S6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AgentDockerConfig {
    pub enabled: bool,
    pub ephemeral: bool,
    pub memory_mb: Option<u64>,
    pub cpu_shares: Option<u64>,
    pub cpu_period: Option<u64>,
    pub cpu_quota: Option<i64>,
    pub max_containers: Option<u32>,
    pub workspace_mode: WorkspaceMode,
    pub tmpfs: Vec<String>,
    pub pids_limit: Option<i64>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceMode {
    Rw,
    Ro,
}

impl Default for WorkspaceMode {
    fn default() -> Self {
        WorkspaceMode::Rw
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    None,
    Bridge,
    Host,
}

impl Default for NetworkMode {
    fn default() -> Self {
        NetworkMode::Bridge
    }
}

/// Fleet-level Docker config: the agent-level subset plus the fields only
/// the fleet operator may set (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FleetDockerConfig {
    pub image: Option<String>,
    pub network: NetworkMode,
    pub volumes: Vec<String>,
    pub user: Option<String>,
    pub ports: Vec<String>,
    pub env: HashMap<String, String>,
    /// Raw passthrough override. Documented bypass (§4.D, §6).
    pub host_config: Option<serde_json::Value>,
}

/// Default container image when not overridden (§6).
pub const DEFAULT_CONTAINER_IMAGE: &str = "anthropic/claude-code:latest";

/// The merged, resolved Docker configuration a job's container runner
/// actually acts on — the fleet-level defaults overridden by the
/// agent-level safe subset.
#[derive(Debug, Clone)]
pub struct ResolvedDockerConfig {
    pub enabled: bool,
    pub ephemeral: bool,
    pub image: String,
    pub network: NetworkMode,
    pub memory_mb: u64,
    pub cpu_shares: Option<u64>,
    pub cpu_period: Option<u64>,
    pub cpu_quota: Option<i64>,
    pub max_containers: u32,
    pub workspace_mode: WorkspaceMode,
    pub tmpfs: Vec<String>,
    pub pids_limit: Option<i64>,
    pub labels: HashMap<String, String>,
    pub volumes: Vec<String>,
    pub user: Option<String>,
    pub ports: Vec<String>,
    pub env: HashMap<String, String>,
    pub host_config: Option<serde_json::Value>,
}

/// Default memory limit when not overridden: 2 GiB (§4.D).
pub const DEFAULT_MEMORY_MB: u64 = 2048;

impl ResolvedDockerConfig {
    pub fn merge(fleet: &FleetDockerConfig, agent: &AgentDockerConfig) -> Self {
        Self {
            enabled: agent.enabled,
            ephemeral: agent.ephemeral,
            image: fleet
                .image
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTAINER_IMAGE.to_string()),
            network: fleet.network,
            memory_mb: agent.memory_mb.unwrap_or(DEFAULT_MEMORY_MB),
            cpu_shares: agent.cpu_shares,
            cpu_period: agent.cpu_period,
            cpu_quota: agent.cpu_quota,
            max_containers: agent.max_containers.unwrap_or(4),
            workspace_mode: agent.workspace_mode,
            tmpfs: agent.tmpfs.clone(),
            pids_limit: agent.pids_limit,
            labels: agent.labels.clone(),
            volumes: fleet.volumes.clone(),
            user: fleet.user.clone(),
            ports: fleet.ports.clone(),
            env: fleet.env.clone(),
            host_config: fleet.host_config.clone(),
        }
    }
}

/// One hook binding (§6, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookBinding {
    pub name: String,
    /// Dot-path predicate, e.g. `job.exit_reason == "error"`.
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub on_events: Vec<String>,
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
    #[serde(default = "default_hook_timeout_secs")]
    pub timeout_secs: u64,
}

impl HookBinding {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_hook_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HookBindings {
    pub after_run: Vec<HookBinding>,
    pub on_error: Vec<HookBinding>,
}

/// A single schedule belonging to an agent (§3, §4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub name: String,
    pub trigger: Trigger,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A schedule's trigger: either a cron expression or a positive interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    Cron { cron: String },
    Interval { interval_secs: u64 },
}

/// The fully resolved agent (§3). Immutable for the duration of a job.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub runtime: RuntimeKind,
    pub docker: ResolvedDockerConfig,
    pub working_directory: PathBuf,
    pub permissions: Permissions,
    pub system_prompt: Option<String>,
    pub default_prompt: Option<String>,
    pub tool_allowed: Vec<String>,
    pub tool_denied: Vec<String>,
    pub mcp_servers: HashMap<String, McpServerDescriptor>,
    pub setting_sources: Vec<SettingSource>,
    pub max_turns: Option<u32>,
    pub metadata_file: Option<PathBuf>,
    pub schedules: Vec<Schedule>,
    pub hooks: HookBindings,
    pub max_concurrent: usize,
    pub queue_enabled: bool,
    pub default_timeout: Duration,
}

impl Agent {
    /// Validate the identity invariant from §3: the name must match the
    /// path-safety pattern before any file path is ever built from it.
    pub fn validate_name(&self) -> Result<(), String> {
        if is_safe_identifier(&self.name) {
            Ok(())
        } else {
            Err(format!(
                "agent name {:?} does not match {}",
                self.name, SAFE_IDENTIFIER_PATTERN
            ))
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
