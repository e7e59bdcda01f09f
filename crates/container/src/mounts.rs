// SPDX-License-Identifier: MIT

//! Path translation for container mounts (§4.D "Mounts"). Grounded on
//! the teacher's corpus-wide bind-mount construction pattern (see
//! `nwiizo-ccswarm`'s `DockerContainerProvider::to_docker_config`),
//! adapted to the fixed mount set this spec names: workspace, auth
//! material, the Docker-side session directory, and user volumes.

use crate::error::ContainerError;
use bollard::service::{Mount, MountTypeEnum};
use herdctl_core::{Agent, WorkspaceMode};
use std::path::Path;

/// Container-side path the agent's working directory is mounted at
/// (§4.D).
pub const WORKSPACE_MOUNT_TARGET: &str = "/workspace";

/// Container-side path the Docker-specific session directory is
/// mounted at. Distinct from the host's own `sessions/` tree — Docker
/// sessions must never share storage with host sessions because
/// session files embed absolute paths that don't resolve across the
/// container boundary (§4.D).
pub const DOCKER_SESSION_MOUNT_TARGET: &str = "/root/.claude";

/// Environment variable naming the host auth directory, mutually
/// exclusive with mounting it (§4.D: "either... or... never both").
const CREDENTIAL_ENV_VARS: &[&str] = &["ANTHROPIC_API_KEY", "CLAUDE_CODE_OAUTH_TOKEN"];

fn bind_mount(source: impl Into<String>, target: impl Into<String>, read_only: bool) -> Mount {
    Mount {
        target: Some(target.into()),
        source: Some(source.into()),
        typ: Some(MountTypeEnum::BIND),
        read_only: Some(read_only),
        ..Default::default()
    }
}

/// Build the fixed workspace + docker-sessions mounts plus any
/// user-declared volumes for one job (§4.D).
pub fn build_mounts(
    agent: &Agent,
    docker_sessions_dir: &Path,
) -> Result<Vec<Mount>, ContainerError> {
    let mut mounts = vec![
        bind_mount(
            agent.working_directory.display().to_string(),
            WORKSPACE_MOUNT_TARGET,
            agent.docker.workspace_mode == WorkspaceMode::Ro,
        ),
        bind_mount(
            docker_sessions_dir.display().to_string(),
            DOCKER_SESSION_MOUNT_TARGET,
            false,
        ),
    ];

    for spec in &agent.docker.volumes {
        mounts.push(parse_volume_spec(spec)?);
    }

    Ok(mounts)
}

/// Parse a `host:container[:mode]` volume spec (§4.D), `mode` one of
/// `ro`/`rw`.
fn parse_volume_spec(spec: &str) -> Result<Mount, ContainerError> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (host, container, mode) = match parts.as_slice() {
        [host, container] => (*host, *container, "rw"),
        [host, container, mode] => (*host, *container, *mode),
        _ => {
            return Err(ContainerError::InvalidMount {
                spec: spec.to_string(),
                reason: "expected host:container[:mode]".to_string(),
            })
        }
    };
    let read_only = match mode {
        "ro" => true,
        "rw" => false,
        other => {
            return Err(ContainerError::InvalidMount {
                spec: spec.to_string(),
                reason: format!("unknown mode {other:?}, expected ro or rw"),
            })
        }
    };
    Ok(bind_mount(host, container, read_only))
}

/// Either passes a host credential env var through, or mounts the
/// host's auth directory read-only — never both (§4.D). Returns the
/// extra environment variables to set and an optional auth mount.
pub fn resolve_auth(auth_dir: Option<&Path>) -> (Vec<(String, String)>, Option<Mount>) {
    for var in CREDENTIAL_ENV_VARS {
        if let Ok(value) = std::env::var(var) {
            return (vec![(var.to_string(), value)], None);
        }
    }
    match auth_dir {
        Some(dir) if dir.exists() => (
            Vec::new(),
            Some(bind_mount(dir.display().to_string(), "/root/.claude-auth", true)),
        ),
        _ => (Vec::new(), None),
    }
}

#[cfg(test)]
#[path = "mounts_tests.rs"]
mod tests;
