// SPDX-License-Identifier: MIT

//! Docker daemon connection and the per-agent container cache (§4.D
//! "Container lifecycle"). Grounded on `nwiizo-ccswarm`'s
//! `DockerContainerProvider` (connection probing, create/start/exec/
//! stop/remove sequencing), restructured around this spec's
//! ephemeral-vs-persistent container model and `max_containers`
//! eviction.

use crate::error::ContainerError;
use crate::mounts::{build_mounts, resolve_auth};
use crate::security::{build_host_config, default_uid_gid};
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::StreamExt;
use herdctl_core::{Agent, ContainerId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const DOCKER_PING_TIMEOUT: Duration = Duration::from_secs(5);

/// A container the manager has created and is holding onto for reuse
/// (persistent agents only — ephemeral containers are removed as soon
/// as their job finishes, §4.D).
struct CachedContainer {
    id: ContainerId,
    docker_id: String,
}

/// Connects to the Docker daemon, creates per-agent containers
/// following this job's [`herdctl_core::ResolvedDockerConfig`], and
/// evicts the oldest persistent container once an agent's
/// `max_containers` is exceeded (§4.D).
pub struct ContainerManager {
    docker: Docker,
    docker_sessions_root: PathBuf,
    cache: Mutex<HashMap<String, Vec<CachedContainer>>>,
}

impl ContainerManager {
    /// Connect using `DOCKER_HOST` if set, otherwise the platform
    /// default socket (§4.D).
    pub async fn connect(docker_sessions_root: PathBuf) -> Result<Self, ContainerError> {
        let docker = Self::connect_to_daemon()?;
        tokio::time::timeout(DOCKER_PING_TIMEOUT, docker.ping())
            .await
            .map_err(|_| ContainerError::DaemonUnreachable("ping timed out".to_string()))?
            .map_err(|err| ContainerError::DaemonUnreachable(err.to_string()))?;
        Ok(Self {
            docker,
            docker_sessions_root,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn connect_to_daemon() -> Result<Docker, ContainerError> {
        if let Ok(docker_host) = std::env::var("DOCKER_HOST") {
            if let Some(path) = docker_host.strip_prefix("unix://") {
                return Docker::connect_with_unix(path, 120, bollard::API_DEFAULT_VERSION)
                    .map_err(|err| ContainerError::DaemonUnreachable(err.to_string()));
            }
        }
        Docker::connect_with_socket_defaults()
            .or_else(|_| Docker::connect_with_local_defaults())
            .map_err(|err| ContainerError::DaemonUnreachable(err.to_string()))
    }

    fn docker_sessions_dir(&self, agent_name: &str) -> PathBuf {
        self.docker_sessions_root.join(agent_name)
    }

    /// Pulls the image if needed, creates the container with the
    /// mounts and host config this job's agent resolves to, and starts
    /// it (§4.D).
    pub async fn provision(
        &self,
        agent: &Agent,
        container_name: &str,
        auth_dir: Option<&Path>,
    ) -> Result<String, ContainerError> {
        self.ensure_image(&agent.docker.image).await?;

        let sessions_dir = self.docker_sessions_dir(&agent.name);
        let mut mounts = build_mounts(agent, &sessions_dir)?;
        let (mut env, auth_mount) = resolve_auth(auth_dir);
        if let Some(mount) = auth_mount {
            mounts.push(mount);
        }
        for (key, value) in &agent.docker.env {
            env.push((key.clone(), value.clone()));
        }

        let uid_gid = agent.docker.user.clone().unwrap_or_else(default_uid_gid);
        let mut host_config = build_host_config(&agent.docker)?;
        host_config.mounts = Some(mounts);

        let config = Config {
            image: Some(agent.docker.image.clone()),
            env: Some(
                env.into_iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect(),
            ),
            working_dir: Some(crate::mounts::WORKSPACE_MOUNT_TARGET.to_string()),
            user: Some(uid_gid.clone()),
            labels: Some(agent.docker.labels.clone()),
            host_config: Some(host_config),
            // The CLI command/args are supplied per-exec (§4.D): the
            // container stays idle (`tail -f /dev/null`) between runs
            // for persistent agents, or runs the command directly and
            // exits for ephemeral ones.
            cmd: Some(vec![
                "tail".to_string(),
                "-f".to_string(),
                "/dev/null".to_string(),
            ]),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: container_name,
            ..Default::default()
        };
        let created = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|err| ContainerError::Create(err.to_string()))?;

        self.docker
            .start_container::<String>(&created.id, None)
            .await
            .map_err(|err| ContainerError::Create(err.to_string()))?;

        self.cache.lock().entry(agent.name.clone()).or_default().push(CachedContainer {
            id: ContainerId::new(uuid::Uuid::new_v4().to_string()),
            docker_id: created.id.clone(),
        });
        self.evict_excess(&agent.name, agent.docker.max_containers as usize);

        Ok(created.id)
    }

    async fn ensure_image(&self, image: &str) -> Result<(), ContainerError> {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            if let Err(err) = progress {
                return Err(ContainerError::ImagePull {
                    image: image.to_string(),
                    source: err.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Runs one command to completion inside an already-running
    /// container and collects its combined stdout+stderr (§4.D —
    /// consumed by the decorator, which re-parses it as `stream-json`).
    pub async fn exec(&self, docker_id: &str, command: Vec<String>) -> Result<String, ContainerError> {
        let exec_options = CreateExecOptions {
            cmd: Some(command),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };
        let exec = self
            .docker
            .create_exec(docker_id, exec_options)
            .await
            .map_err(|err| ContainerError::Exec {
                container_id: docker_id.to_string(),
                source: err.to_string(),
            })?;

        match self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|err| ContainerError::Exec {
                container_id: docker_id.to_string(),
                source: err.to_string(),
            })? {
            StartExecResults::Attached { mut output, .. } => {
                let mut collected = String::new();
                while let Some(chunk) = output.next().await {
                    match chunk {
                        Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                            collected.push_str(&String::from_utf8_lossy(&message));
                        }
                        Ok(_) => {}
                        Err(err) => {
                            return Err(ContainerError::Exec {
                                container_id: docker_id.to_string(),
                                source: err.to_string(),
                            })
                        }
                    }
                }
                Ok(collected)
            }
            StartExecResults::Detached => Err(ContainerError::Exec {
                container_id: docker_id.to_string(),
                source: "exec was detached unexpectedly".to_string(),
            }),
        }
    }

    /// Streams logs from a running container, used when the exec'd
    /// command is long-running rather than collected in one shot.
    pub fn logs(&self, docker_id: &str) -> futures_util::stream::BoxStream<'_, Result<LogOutput, ContainerError>> {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        Box::pin(
            self.docker
                .logs(docker_id, Some(options))
                .map(|item| item.map_err(|err| ContainerError::Exec {
                    container_id: docker_id.to_string(),
                    source: err.to_string(),
                })),
        )
    }

    /// Stops and removes one container, used for ephemeral agents
    /// right after their job finishes (§4.D).
    pub async fn teardown(&self, docker_id: &str) -> Result<(), ContainerError> {
        let _ = self
            .docker
            .stop_container(docker_id, Some(StopContainerOptions { t: 10 }))
            .await;
        self.docker
            .remove_container(
                docker_id,
                Some(RemoveContainerOptions {
                    force: true,
                    v: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|err| ContainerError::Create(err.to_string()))
    }

    /// Tears down all cached containers, used on daemon shutdown
    /// (§4.D, §4.G).
    pub async fn shutdown(&self) {
        let cached: Vec<CachedContainer> = {
            let mut cache = self.cache.lock();
            cache.drain().flat_map(|(_, containers)| containers).collect()
        };
        for container in cached {
            if let Err(err) = self.teardown(&container.docker_id).await {
                tracing::warn!(container_id = %container.id, error = %err, "failed to tear down container during shutdown");
            }
        }
    }

    /// Oldest-first eviction once an agent exceeds its configured
    /// `max_containers` (§4.D).
    fn evict_excess(&self, agent_name: &str, max_containers: usize) {
        let overflow: Vec<CachedContainer> = {
            let mut cache = self.cache.lock();
            let Some(containers) = cache.get_mut(agent_name) else {
                return;
            };
            let excess = excess_count(containers.len(), max_containers);
            containers.drain(0..excess).collect()
        };
        for container in overflow {
            let docker = self.docker.clone();
            let docker_id = container.docker_id;
            tokio::spawn(async move {
                let _ = docker
                    .remove_container(
                        &docker_id,
                        Some(RemoveContainerOptions {
                            force: true,
                            v: true,
                            ..Default::default()
                        }),
                    )
                    .await;
            });
        }
    }
}

/// How many of `current` cached containers to evict to bring the
/// count down to `max_containers` (floor of one container always kept
/// available).
fn excess_count(current: usize, max_containers: usize) -> usize {
    let floor = max_containers.max(1);
    current.saturating_sub(floor)
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
