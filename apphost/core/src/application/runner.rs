// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Starts a prepared application on a container runtime, watches health
//! probes and tears everything down again.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::builder::DistributedApplication;
use crate::domain::certificate::DeveloperCertificateService;
use crate::domain::error::AppHostError;
use crate::domain::events::ResourceEvent;
use crate::domain::runtime::{
    ContainerId, ContainerLaunchSpec, ContainerRuntime, ContainerState, HealthChecker, PortAllocator,
};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub health_timeout: Duration,
    pub health_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            health_timeout: Duration::from_secs(120),
            health_interval: Duration::from_secs(2),
        }
    }
}

/// Containers started for one run, in start order.
#[derive(Debug, Default)]
pub struct RunningApplication {
    containers: Vec<(ContainerLaunchSpec, ContainerId)>,
}

impl RunningApplication {
    pub fn containers(&self) -> impl Iterator<Item = (&ContainerLaunchSpec, &ContainerId)> {
        self.containers.iter().map(|(spec, id)| (spec, id))
    }

    pub fn spec(&self, resource: &str) -> Option<&ContainerLaunchSpec> {
        self.containers
            .iter()
            .find(|(spec, _)| spec.resource_name == resource)
            .map(|(spec, _)| spec)
    }
}

pub struct AppHostRunner {
    runtime: Arc<dyn ContainerRuntime>,
    developer_certificates: Arc<dyn DeveloperCertificateService>,
    ports: Arc<dyn PortAllocator>,
    health: Arc<dyn HealthChecker>,
    events: EventBus,
    options: RunOptions,
}

impl AppHostRunner {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        developer_certificates: Arc<dyn DeveloperCertificateService>,
        ports: Arc<dyn PortAllocator>,
        health: Arc<dyn HealthChecker>,
        events: EventBus,
        options: RunOptions,
    ) -> Self {
        Self {
            runtime,
            developer_certificates,
            ports,
            health,
            events,
            options,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Prepare and start every resource. If one fails to start, the ones
    /// already started are removed and the error is returned.
    pub async fn start(
        &self,
        app: &DistributedApplication,
        cancellation: &CancellationToken,
    ) -> Result<RunningApplication, AppHostError> {
        let specs = app.prepare_launch(
            self.developer_certificates.clone(),
            self.ports.as_ref(),
            cancellation,
        )?;

        let mut running = RunningApplication::default();
        for spec in specs {
            if cancellation.is_cancelled() {
                self.shutdown(running).await;
                return Err(AppHostError::Cancelled);
            }

            self.events.publish(ResourceEvent::Starting {
                resource: spec.resource_name.clone(),
                image: spec.image.clone(),
                at: Utc::now(),
            });

            match self.runtime.start(&spec).await {
                Ok(id) => {
                    self.events.publish(ResourceEvent::Running {
                        resource: spec.resource_name.clone(),
                        container_id: id.clone(),
                        urls: spec.urls.clone(),
                        at: Utc::now(),
                    });
                    running.containers.push((spec, id));
                }
                Err(e) => {
                    error!("Resource '{}' failed to start: {}", spec.resource_name, e);
                    self.events.publish(ResourceEvent::FailedToStart {
                        resource: spec.resource_name.clone(),
                        error: e.to_string(),
                        at: Utc::now(),
                    });
                    self.shutdown(running).await;
                    return Err(e.into());
                }
            }
        }

        info!("Started {} resource(s)", running.containers.len());
        Ok(running)
    }

    /// Poll every health probe until it succeeds or the timeout elapses.
    /// Returns the names of resources that never became healthy.
    pub async fn wait_for_health(
        &self,
        running: &RunningApplication,
        cancellation: &CancellationToken,
    ) -> Vec<String> {
        let mut unhealthy = Vec::new();

        for (spec, id) in &running.containers {
            let mut healthy = true;
            for probe in &spec.health_probes {
                let deadline = tokio::time::Instant::now() + self.options.health_timeout;
                let ok = loop {
                    if self.health.check(probe).await {
                        break true;
                    }
                    if tokio::time::Instant::now() >= deadline || self.has_exited(spec, id).await {
                        break false;
                    }
                    tokio::select! {
                        _ = cancellation.cancelled() => break false,
                        _ = tokio::time::sleep(self.options.health_interval) => {}
                    }
                };

                if !ok {
                    warn!("Resource '{}' is not healthy at {}", spec.resource_name, probe.url);
                    self.events.publish(ResourceEvent::Unhealthy {
                        resource: spec.resource_name.clone(),
                        probe_url: probe.url.clone(),
                        at: Utc::now(),
                    });
                    healthy = false;
                    break;
                }
            }

            if healthy {
                self.events.publish(ResourceEvent::Healthy {
                    resource: spec.resource_name.clone(),
                    at: Utc::now(),
                });
            } else {
                unhealthy.push(spec.resource_name.clone());
            }
        }

        unhealthy
    }

    async fn has_exited(&self, spec: &ContainerLaunchSpec, id: &ContainerId) -> bool {
        match self.runtime.status(id).await {
            Ok(status) if status.state == ContainerState::Exited => {
                warn!(
                    "Container for '{}' exited (started at {})",
                    spec.resource_name,
                    status
                        .started_at
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                true
            }
            Ok(_) => false,
            Err(e) => {
                debug!("Status of '{}' unavailable: {}", spec.resource_name, e);
                false
            }
        }
    }

    /// Remove all containers in reverse start order. Failures are logged and
    /// do not stop the remaining removals.
    pub async fn shutdown(&self, running: RunningApplication) {
        for (spec, id) in running.containers.into_iter().rev() {
            match self.runtime.stop(&id).await {
                Ok(()) => self.events.publish(ResourceEvent::Stopped {
                    resource: spec.resource_name,
                    at: Utc::now(),
                }),
                Err(e) => warn!("Failed to remove container for '{}': {}", spec.resource_name, e),
            }
        }
    }
}
