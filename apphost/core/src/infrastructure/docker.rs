// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use bollard::models::{ContainerCreateBody, ContainerStateStatusEnum, HostConfig, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, InspectContainerOptions,
    RemoveContainerOptionsBuilder, StartContainerOptions,
};
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::domain::runtime::{
    ContainerId, ContainerLaunchSpec, ContainerRuntime, ContainerState, ContainerStatus, RuntimeError,
};

pub const RESOURCE_LABEL: &str = "dev.apphost.resource";

pub struct DockerContainerRuntime {
    docker: Docker,
    autopull: bool,
}

impl DockerContainerRuntime {
    pub fn new(socket_path: Option<String>, autopull: bool) -> Result<Self, RuntimeError> {
        let docker = if let Some(path) = socket_path {
            #[cfg(unix)]
            let result = Docker::connect_with_unix(&path, 120, bollard::API_DEFAULT_VERSION);

            #[cfg(windows)]
            let result = Docker::connect_with_named_pipe(&path, 120, bollard::API_DEFAULT_VERSION);

            result.map_err(|e| RuntimeError::ConnectionFailed(format!(
                "Failed to connect to Docker at {}: {}\n\n\
                 Ensure Docker is running and the socket path is correct.",
                path, e
            )))?
        } else {
            Docker::connect_with_local_defaults().map_err(|e| RuntimeError::ConnectionFailed(format!(
                "Failed to connect to Docker: {}\n\n\
                 Common causes:\n\
                 - Docker daemon not running (check: docker ps)\n\
                 - Permission denied accessing Docker socket\n\
                 - On Linux: Current user not in 'docker' group",
                e
            )))?
        };

        Ok(Self { docker, autopull })
    }

    /// Verify Docker daemon is accessible
    pub async fn healthcheck(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await.map_err(|e| RuntimeError::ConnectionFailed(format!(
            "Cannot connect to Docker daemon: {}\n\nVerify with: docker ps",
            e
        )))?;
        Ok(())
    }

    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }
        if !self.autopull {
            return Err(RuntimeError::ImagePullFailed(format!(
                "Image {} not found locally and autopull is disabled",
                image
            )));
        }

        info!("Pulling image: {}", image);
        let options = CreateImageOptionsBuilder::default().from_image(image).build();
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            if let Err(e) = result {
                return Err(RuntimeError::ImagePullFailed(format!(
                    "Failed to pull image {}: {}\n\nTry manually: docker pull {}",
                    image, e, image
                )));
            }
        }
        info!("Successfully pulled image: {}", image);
        Ok(())
    }
}

/// Docker create body for a launch spec.
pub fn container_body(spec: &ContainerLaunchSpec) -> ContainerCreateBody {
    let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = spec
        .endpoints
        .iter()
        .map(|endpoint| {
            (
                format!("{}/tcp", endpoint.target_port),
                Some(vec![PortBinding {
                    host_ip: Some("127.0.0.1".to_string()),
                    host_port: Some(endpoint.host_port.to_string()),
                }]),
            )
        })
        .collect();

    let binds: Vec<String> = spec.volumes.iter().map(|v| v.to_bind_spec()).collect();

    let env: Vec<String> = spec
        .environment
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();

    let host_config = HostConfig {
        port_bindings: Some(port_bindings),
        binds: if binds.is_empty() { None } else { Some(binds) },
        ..Default::default()
    };

    ContainerCreateBody {
        image: Some(spec.image.clone()),
        cmd: if spec.args.is_empty() { None } else { Some(spec.args.clone()) },
        env: Some(env),
        labels: Some(HashMap::from([(RESOURCE_LABEL.to_string(), spec.resource_name.clone())])),
        host_config: Some(host_config),
        ..Default::default()
    }
}

#[async_trait]
impl ContainerRuntime for DockerContainerRuntime {
    async fn start(&self, spec: &ContainerLaunchSpec) -> Result<ContainerId, RuntimeError> {
        self.ensure_image(&spec.image).await?;

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("{}-{}", spec.resource_name, &suffix[..8]);
        let options = CreateContainerOptionsBuilder::default().name(&name).build();

        debug!("Creating container {} from {}", name, spec.image);
        let response = self
            .docker
            .create_container(Some(options), container_body(spec))
            .await
            .map_err(|e| RuntimeError::SpawnFailed(format!("{}: {}", spec.resource_name, e)))?;

        for warning in &response.warnings {
            warn!("Docker warning for {}: {}", name, warning);
        }

        self.docker
            .start_container(&response.id, None::<StartContainerOptions>)
            .await
            .map_err(|e| RuntimeError::SpawnFailed(format!("Failed to start container {}: {}", name, e)))?;

        info!("Started container {} for resource '{}'", name, spec.resource_name);
        Ok(ContainerId::new(response.id))
    }

    async fn stop(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptionsBuilder::default().force(true).build();
        self.docker
            .remove_container(id.as_str(), Some(options))
            .await
            .map_err(|e| RuntimeError::TerminationFailed(e.to_string()))?;

        info!("Removed container: {}", id.as_str());
        Ok(())
    }

    async fn status(&self, id: &ContainerId) -> Result<ContainerStatus, RuntimeError> {
        let inspect = self
            .docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| RuntimeError::InstanceNotFound(e.to_string()))?;

        let state = inspect.state.unwrap_or_default();
        let started_at = state
            .started_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));

        let state = match state.status {
            Some(ContainerStateStatusEnum::CREATED) => ContainerState::Created,
            Some(ContainerStateStatusEnum::RUNNING) => ContainerState::Running,
            Some(ContainerStateStatusEnum::EXITED) | Some(ContainerStateStatusEnum::DEAD) => ContainerState::Exited,
            _ => ContainerState::Unknown,
        };

        Ok(ContainerStatus {
            id: id.clone(),
            state,
            started_at,
        })
    }
}
