use super::*;
use herdctl_core::{FleetDockerConfig, AgentDockerConfig};

fn resolved() -> ResolvedDockerConfig {
    ResolvedDockerConfig::merge(&FleetDockerConfig::default(), &AgentDockerConfig::default())
}

#[test]
fn default_host_config_drops_all_capabilities() {
    let host_config = build_host_config(&resolved()).expect("host config");
    assert_eq!(host_config.cap_drop, Some(vec!["ALL".to_string()]));
    assert_eq!(
        host_config.security_opt,
        Some(vec!["no-new-privileges".to_string()])
    );
}

#[test]
fn default_memory_limit_is_applied_in_bytes() {
    let host_config = build_host_config(&resolved()).expect("host config");
    assert_eq!(host_config.memory, Some(herdctl_core::DEFAULT_MEMORY_MB as i64 * 1024 * 1024));
}

#[test]
fn raw_host_config_override_wins_over_defaults() {
    let mut docker = resolved();
    docker.host_config = Some(serde_json::json!({ "CapDrop": ["NET_ADMIN"] }));
    let host_config = build_host_config(&docker).expect("host config");
    assert_eq!(host_config.cap_drop, Some(vec!["NET_ADMIN".to_string()]));
}

#[test]
fn invalid_port_spec_is_rejected() {
    let mut docker = resolved();
    docker.ports = vec!["not-a-port".to_string()];
    let err = build_host_config(&docker).unwrap_err();
    assert!(matches!(err, ContainerError::InvalidMount { .. }));
}

#[test]
fn default_uid_gid_is_a_colon_separated_pair_of_numbers() {
    let uid_gid = default_uid_gid();
    let (uid, gid) = uid_gid.split_once(':').expect("uid:gid format");
    assert!(uid.parse::<u32>().is_ok());
    assert!(gid.parse::<u32>().is_ok());
}
