// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::endpoint::{AllocatedEndpoint, ResourceUrl};
use crate::domain::volume::VolumeMount;

/// Fully resolved description of one container to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLaunchSpec {
    pub resource_name: String,
    pub image: String,
    pub args: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub endpoints: Vec<AllocatedEndpoint>,
    pub volumes: Vec<VolumeMount>,
    pub health_probes: Vec<HealthProbe>,
    pub urls: Vec<ResourceUrl>,
}

impl ContainerLaunchSpec {
    pub fn endpoint(&self, name: &str) -> Option<&AllocatedEndpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthProbe {
    pub endpoint_name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Exited,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub id: ContainerId,
    pub state: ContainerState,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to connect to container engine: {0}")]
    ConnectionFailed(String),
    #[error("Failed to pull image: {0}")]
    ImagePullFailed(String),
    #[error("Failed to start container: {0}")]
    SpawnFailed(String),
    #[error("Failed to stop container: {0}")]
    TerminationFailed(String),
    #[error("Container not found: {0}")]
    InstanceNotFound(String),
    #[error("Failed to allocate host port: {0}")]
    PortAllocationFailed(String),
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn start(&self, spec: &ContainerLaunchSpec) -> Result<ContainerId, RuntimeError>;
    async fn stop(&self, id: &ContainerId) -> Result<(), RuntimeError>;
    async fn status(&self, id: &ContainerId) -> Result<ContainerStatus, RuntimeError>;
}

/// Source of ephemeral host ports for endpoints that are not pinned.
pub trait PortAllocator: Send + Sync {
    fn allocate(&self) -> Result<u16, RuntimeError>;
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// True once the probe URL answers with a success status.
    async fn check(&self, probe: &HealthProbe) -> bool;
}
