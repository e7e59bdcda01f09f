// SPDX-License-Identifier: MIT

//! Builds the container's [`HostConfig`] from a [`ResolvedDockerConfig`]
//! (§4.D "Security defaults"). Grounded on `nwiizo-ccswarm`'s
//! `DockerContainerProvider::to_docker_config`'s host-config assembly,
//! extended with the fixed security defaults this spec names and the
//! fleet-level raw `host_config` override.

use crate::error::ContainerError;
use bollard::models::PortBinding;
use bollard::service::HostConfig;
use herdctl_core::{NetworkMode as HerdctlNetworkMode, ResolvedDockerConfig};
use std::collections::HashMap;

/// Fixed security hardening applied to every agent container, not
/// configurable (§4.D): no new privileges and every capability dropped.
fn security_opts() -> Vec<String> {
    vec!["no-new-privileges".to_string()]
}

fn network_mode_str(mode: HerdctlNetworkMode) -> &'static str {
    match mode {
        HerdctlNetworkMode::None => "none",
        HerdctlNetworkMode::Bridge => "bridge",
        HerdctlNetworkMode::Host => "host",
    }
}

fn port_bindings(ports: &[String]) -> Result<HashMap<String, Option<Vec<PortBinding>>>, ContainerError> {
    let mut bindings = HashMap::new();
    for spec in ports {
        let (host_port, container_port) = spec.split_once(':').ok_or_else(|| {
            ContainerError::InvalidMount {
                spec: spec.clone(),
                reason: "expected host_port:container_port".to_string(),
            }
        })?;
        bindings.insert(
            format!("{container_port}/tcp"),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(host_port.to_string()),
            }]),
        );
    }
    Ok(bindings)
}

/// Build the [`HostConfig`] for one job's container, applying the fixed
/// security defaults, the agent's resource limits, and finally the
/// fleet-level raw `host_config` override (§4.D, §6: "the one
/// documented bypass of the safe-subset split"). The non-root user
/// itself is a `Config`-level field, not `HostConfig`; see
/// [`crate::manager::ContainerManager::provision`] and
/// [`default_uid_gid`].
pub fn build_host_config(docker: &ResolvedDockerConfig) -> Result<HostConfig, ContainerError> {
    let mut host_config = HostConfig {
        security_opt: Some(security_opts()),
        cap_drop: Some(vec!["ALL".to_string()]),
        memory: Some((docker.memory_mb as i64) * 1024 * 1024),
        memory_swap: Some((docker.memory_mb as i64) * 1024 * 1024),
        cpu_shares: docker.cpu_shares.map(|v| v as i64),
        cpu_period: docker.cpu_period.map(|v| v as i64),
        cpu_quota: docker.cpu_quota,
        pids_limit: docker.pids_limit,
        network_mode: Some(network_mode_str(docker.network).to_string()),
        port_bindings: Some(port_bindings(&docker.ports)?),
        tmpfs: Some(
            docker
                .tmpfs
                .iter()
                .map(|path| (path.clone(), String::new()))
                .collect(),
        ),
        ..Default::default()
    };

    if let Some(override_value) = &docker.host_config {
        apply_raw_override(&mut host_config, override_value)?;
    }

    Ok(host_config)
}

/// The non-root `UID:GID` a container's `Config.user` defaults to when
/// the agent doesn't set `docker.user` explicitly: the host's own
/// current UID:GID, so files the agent writes under the workspace
/// bind-mount remain owned by the invoking user rather than a
/// container-local root (§4.D "Security defaults").
#[cfg(unix)]
pub fn default_uid_gid() -> String {
    format!("{}:{}", nix::unistd::Uid::current(), nix::unistd::Gid::current())
}

#[cfg(not(unix))]
pub fn default_uid_gid() -> String {
    "0:0".to_string()
}

/// Merges the fleet operator's raw `host_config` JSON on top of the
/// computed defaults. Any field the override sets wins; this is the
/// one place operator-trusted JSON reaches the Docker API directly
/// (§4.D, §6).
fn apply_raw_override(
    host_config: &mut HostConfig,
    override_value: &serde_json::Value,
) -> Result<(), ContainerError> {
    let mut base = serde_json::to_value(&*host_config)
        .map_err(|err| ContainerError::Create(format!("failed to serialize host config: {err}")))?;
    merge_json(&mut base, override_value);
    *host_config = serde_json::from_value(base)
        .map_err(|err| ContainerError::Create(format!("failed to apply host_config override: {err}")))?;
    Ok(())
}

fn merge_json(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                merge_json(base_map.entry(key.clone()).or_insert(serde_json::Value::Null), value);
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
#[path = "security_tests.rs"]
mod tests;
