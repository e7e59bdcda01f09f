// SPDX-License-Identifier: MIT

//! Test-only `Agent` builder shared across crates (feature `test-support`).

use crate::agent::{
    Agent, HookBindings, NetworkMode, Permissions, ResolvedDockerConfig, RuntimeKind,
    WorkspaceMode,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A minimal, valid `Agent` with sane defaults, for tests that only
/// care about a handful of fields. Mirrors the builder pattern the
/// teacher uses for its own fixture helpers.
pub fn test_agent(name: &str) -> Agent {
    Agent {
        name: name.to_string(),
        runtime: RuntimeKind::Sdk,
        docker: ResolvedDockerConfig {
            enabled: false,
            ephemeral: true,
            image: "anthropic/claude-code:latest".to_string(),
            network: NetworkMode::Bridge,
            memory_mb: 2048,
            cpu_shares: None,
            cpu_period: None,
            cpu_quota: None,
            max_containers: 4,
            workspace_mode: WorkspaceMode::Rw,
            tmpfs: Vec::new(),
            pids_limit: None,
            labels: HashMap::new(),
            volumes: Vec::new(),
            user: None,
            ports: Vec::new(),
            env: HashMap::new(),
            host_config: None,
        },
        working_directory: PathBuf::from("/workspace"),
        permissions: Permissions::default(),
        system_prompt: None,
        default_prompt: None,
        tool_allowed: Vec::new(),
        tool_denied: Vec::new(),
        mcp_servers: HashMap::new(),
        setting_sources: Vec::new(),
        max_turns: None,
        metadata_file: None,
        schedules: Vec::new(),
        hooks: HookBindings::default(),
        max_concurrent: 1,
        queue_enabled: false,
        default_timeout: Duration::from_secs(600),
    }
}
