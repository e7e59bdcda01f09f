// SPDX-License-Identifier: MIT

//! Fleet configuration loading (SPEC_FULL "Configuration loading"):
//! a strict, `deny_unknown_fields` schema for the "Agent configuration
//! surface" (§6), `${VAR}` substitution, and resolution into the
//! immutable [`herdctl_core::Agent`] the rest of the fleet consumes.
//!
//! The YAML/env *loader* is named as an out-of-core collaborator in
//! §1, but the core still needs a concrete, strictly-validated shape
//! to reject malformed input before an `Agent` is ever constructed —
//! this module is that shape, kept deliberately thin (no retry, no
//! hot-reload, no multi-file includes).

use herdctl_core::{
    is_safe_identifier, Agent, AgentDockerConfig, BashPermissions, FleetDockerConfig, HookBinding,
    HookBindings, McpServerDescriptor, PermissionMode, Permissions, ResolvedDockerConfig,
    RuntimeKind, SettingSource, Trigger, SAFE_IDENTIFIER_PATTERN,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("validation failed:\n{}", .issues.iter().map(|i| format!("  - {i}")).collect::<Vec<_>>().join("\n"))]
    Validation { issues: Vec<herdctl_core::ValidationIssue> },
}

/// Raw, strictly-schema'd agent surface exactly as §6's table names it.
/// `deny_unknown_fields` is what gives us "unknown fields are rejected
/// with location information" for free via `serde_yaml`'s error, and is
/// also what naturally rejects a fleet-only Docker field set at the
/// agent level (§8 S6) — [`RawAgentDockerConfig`] below simply has no
/// `network`/`host_config`/etc. fields to deserialize into.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAgentConfig {
    #[serde(default)]
    runtime: RawRuntime,
    working_directory: Option<String>,
    /// Deprecated alias for `working_directory` (§6): accepted with a
    /// warning, otherwise identical.
    workspace: Option<String>,
    #[serde(default)]
    permissions: RawPermissions,
    #[serde(default)]
    mcp_servers: IndexMap<String, McpServerDescriptor>,
    #[serde(default)]
    setting_sources: Vec<SettingSource>,
    system_prompt: Option<String>,
    default_prompt: Option<String>,
    max_turns: Option<u32>,
    metadata_file: Option<String>,
    #[serde(default)]
    docker: AgentDockerConfig,
    #[serde(default)]
    schedules: IndexMap<String, RawSchedule>,
    #[serde(default)]
    hooks: HookBindings,
    #[serde(default = "default_max_concurrent")]
    max_concurrent: usize,
    #[serde(default)]
    queue_enabled: bool,
    #[serde(default = "default_timeout_secs")]
    default_timeout_secs: u64,
}

fn default_max_concurrent() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawRuntime {
    Sdk,
    Cli {
        #[serde(default)]
        command: Option<String>,
    },
}

impl Default for RawRuntime {
    fn default() -> Self {
        RawRuntime::Sdk
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct RawPermissions {
    mode: PermissionMode,
    allowed_tools: Vec<String>,
    denied_tools: Vec<String>,
    bash: BashPermissions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchedule {
    trigger: Trigger,
    prompt: Option<String>,
    #[serde(default = "default_true")]
    enabled: bool,
}

fn default_true() -> bool {
    true
}

/// The fleet-wide document: a map of agent name to its config surface,
/// plus the fleet-level Docker defaults every agent's safe subset
/// merges against (§6 "Docker configuration tiers").
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RawFleetConfig {
    agents: IndexMap<String, RawAgentConfig>,
    docker: FleetDockerConfig,
}

impl Default for RawFleetConfig {
    fn default() -> Self {
        Self {
            agents: IndexMap::new(),
            docker: FleetDockerConfig::default(),
        }
    }
}

/// A loaded, validated fleet configuration: every agent already
/// resolved into an immutable [`Agent`] (§3, §6).
pub struct FleetConfig {
    pub agents: Vec<Agent>,
}

impl FleetConfig {
    /// Load and validate a fleet config from a YAML file at `path`,
    /// with `${VAR}` substitution resolved against the process
    /// environment before schema validation (§6 "`${VAR}` substitution
    /// in config values is resolved before schema validation").
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw_text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw_text)
    }

    /// Resolve the state-root env var / CLI precedence (SPEC_FULL:
    /// "loads once at startup from a YAML file path given on the
    /// command line or `HERDCTL_CONFIG` env var").
    pub fn config_path_from_env(cli_arg: Option<&str>) -> Option<PathBuf> {
        cli_arg
            .map(PathBuf::from)
            .or_else(|| std::env::var("HERDCTL_CONFIG").ok().map(PathBuf::from))
    }

    /// Parse and validate fleet config from an in-memory YAML document.
    /// Exposed separately from [`Self::load`] so tests can exercise
    /// validation without touching the filesystem.
    pub fn parse(raw_text: &str) -> Result<Self, ConfigError> {
        let substituted = substitute_env_vars(raw_text);

        let raw: RawFleetConfig = match serde_yaml::from_str(&substituted) {
            Ok(raw) => raw,
            Err(err) => {
                return Err(ConfigError::Validation {
                    issues: vec![herdctl_core::ValidationIssue {
                        field: "<root>".to_string(),
                        message: err.to_string(),
                        line: err.location().map(|l| l.line()),
                    }],
                })
            }
        };

        let mut issues = Vec::new();
        let mut agents = Vec::new();
        for (name, raw_agent) in &raw.agents {
            match resolve_agent(name, raw_agent, &raw.docker) {
                Ok(agent) => agents.push(agent),
                Err(mut agent_issues) => issues.append(&mut agent_issues),
            }
        }

        if !issues.is_empty() {
            return Err(ConfigError::Validation { issues });
        }

        Ok(FleetConfig { agents })
    }
}

/// Resolve one raw agent surface into an [`Agent`], collecting every
/// violation rather than stopping at the first (§7 "User-visible
/// behavior": "Validation errors list every violation").
fn resolve_agent(
    name: &str,
    raw: &RawAgentConfig,
    fleet_docker: &FleetDockerConfig,
) -> Result<Agent, Vec<herdctl_core::ValidationIssue>> {
    let mut issues = Vec::new();

    if !is_safe_identifier(name) {
        issues.push(herdctl_core::ValidationIssue {
            field: format!("agents.{name}.name"),
            message: format!("agent name must match {SAFE_IDENTIFIER_PATTERN}"),
            line: None,
        });
    }

    let working_directory = match (&raw.working_directory, &raw.workspace) {
        (Some(dir), _) => Some(dir.clone()),
        (None, Some(legacy)) => {
            tracing::warn!(
                agent = name,
                "`workspace` is deprecated, use `working_directory` instead"
            );
            Some(legacy.clone())
        }
        (None, None) => None,
    };
    let Some(working_directory) = working_directory else {
        issues.push(herdctl_core::ValidationIssue {
            field: format!("agents.{name}.working_directory"),
            message: "working_directory is required".to_string(),
            line: None,
        });
        return Err(issues);
    };

    for schedule_name in raw.schedules.keys() {
        if !is_safe_identifier(schedule_name) {
            issues.push(herdctl_core::ValidationIssue {
                field: format!("agents.{name}.schedules.{schedule_name}"),
                message: format!("schedule name must match {SAFE_IDENTIFIER_PATTERN}"),
                line: None,
            });
        }
    }

    if !issues.is_empty() {
        return Err(issues);
    }

    let runtime = match &raw.runtime {
        RawRuntime::Sdk => RuntimeKind::Sdk,
        RawRuntime::Cli { command } => RuntimeKind::Cli {
            command: command.clone(),
        },
    };

    let docker = ResolvedDockerConfig::merge(fleet_docker, &raw.docker);

    let schedules = raw
        .schedules
        .iter()
        .map(|(name, raw_schedule)| herdctl_core::Schedule {
            name: name.clone(),
            trigger: raw_schedule.trigger.clone(),
            prompt: raw_schedule.prompt.clone(),
            enabled: raw_schedule.enabled,
        })
        .collect();

    Ok(Agent {
        name: name.to_string(),
        runtime,
        docker,
        working_directory: PathBuf::from(working_directory),
        permissions: Permissions {
            mode: raw.permissions.mode,
            allowed_tools: raw.permissions.allowed_tools.clone(),
            denied_tools: raw.permissions.denied_tools.clone(),
            bash: raw.permissions.bash.clone(),
        },
        system_prompt: raw.system_prompt.clone(),
        default_prompt: raw.default_prompt.clone(),
        tool_allowed: raw.permissions.allowed_tools.clone(),
        tool_denied: raw.permissions.denied_tools.clone(),
        mcp_servers: raw
            .mcp_servers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<HashMap<_, _>>(),
        setting_sources: raw.setting_sources.clone(),
        max_turns: raw.max_turns,
        metadata_file: raw.metadata_file.clone().map(PathBuf::from),
        schedules,
        hooks: raw.hooks.clone(),
        max_concurrent: raw.max_concurrent,
        queue_enabled: raw.queue_enabled,
        default_timeout: Duration::from_secs(raw.default_timeout_secs),
    })
}

/// Replace every `${VAR}` occurrence with the named environment
/// variable's value, applied to the raw document text *before* YAML
/// parsing (§6). An unset variable is left as an empty string rather
/// than failing outright — the resulting value then fails ordinary
/// schema validation (e.g. a now-empty `working_directory`) instead of
/// panicking here.
fn substitute_env_vars(raw_text: &str) -> String {
    let mut out = String::with_capacity(raw_text.len());
    let mut chars = raw_text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                if next == '}' {
                    closed = true;
                    break;
                }
                name.push(next);
            }
            if closed {
                out.push_str(&std::env::var(&name).unwrap_or_default());
            } else {
                out.push_str("${");
                out.push_str(&name);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
