// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Turns the declared graph into concrete container launch specs.
//!
//! Order matters: the before-start event runs first so deferred endpoint
//! changes are visible, then host ports are allocated, then environment and
//! certificate callbacks are evaluated and resolved.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::builder::DistributedApplication;
use crate::application::eventing::BeforeStartEvent;
use crate::domain::certificate::{
    select_certificate, DeveloperCertificateService, HttpsCertificateConfigurationContext,
};
use crate::domain::endpoint::{AllocatedEndpoint, ResourceUrl, UriScheme, UrlDisplayLocation};
use crate::domain::environment::{resolve_environment, EnvironmentContext};
use crate::domain::error::AppHostError;
use crate::domain::parameter::ParameterValues;
use crate::domain::resource::ContainerResource;
use crate::domain::runtime::{ContainerLaunchSpec, HealthProbe, PortAllocator};

pub const LOCAL_HOST: &str = "localhost";

impl DistributedApplication {
    /// Raise the before-start event and produce one launch spec per resource.
    pub fn prepare_launch(
        &self,
        developer_certificates: Arc<dyn DeveloperCertificateService>,
        ports: &dyn PortAllocator,
        cancellation: &CancellationToken,
    ) -> Result<Vec<ContainerLaunchSpec>, AppHostError> {
        if !self.execution_context.is_run_mode() {
            return Err(AppHostError::InvalidArgument(
                "containers can only be launched in run mode".to_string(),
            ));
        }

        let event = BeforeStartEvent::new(developer_certificates.clone());
        self.eventing.publish_before_start(&event, cancellation)?;

        self.resources
            .iter()
            .map(|resource| {
                let resource = resource.read();
                build_launch_spec(
                    resource.container(),
                    &self.parameter_values,
                    developer_certificates.as_ref(),
                    ports,
                )
            })
            .collect()
    }
}

pub fn build_launch_spec(
    container: &ContainerResource,
    values: &ParameterValues,
    developer_certificates: &dyn DeveloperCertificateService,
    ports: &dyn PortAllocator,
) -> Result<ContainerLaunchSpec, AppHostError> {
    let name = container.name();

    let endpoints = container
        .endpoints()
        .iter()
        .map(|endpoint| -> Result<AllocatedEndpoint, AppHostError> {
            let host_port = match endpoint.port {
                Some(port) => port,
                None => ports.allocate()?,
            };
            info!(
                "Resource '{}' endpoint '{}': {}://{}:{} -> {}{}",
                name,
                endpoint.name,
                endpoint.scheme,
                LOCAL_HOST,
                host_port,
                endpoint.target_port,
                if endpoint.is_pinned() { " (pinned)" } else { "" }
            );
            Ok(AllocatedEndpoint {
                name: endpoint.name.clone(),
                scheme: endpoint.scheme,
                host: LOCAL_HOST.to_string(),
                host_port,
                target_port: endpoint.target_port,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut env = EnvironmentContext::new();
    for callback in container.environment_callbacks() {
        callback(&mut env)?;
    }
    for endpoint in container.endpoints() {
        if let Some(var) = &endpoint.env {
            env.set(var.clone(), endpoint.target_port.to_string());
        }
    }

    let mut args = container.args.clone();
    let mut volumes = container.volumes.clone();

    if container.endpoints().iter().any(|e| e.scheme == UriScheme::Https) {
        match select_certificate(container.https_certificate(), developer_certificates) {
            Some(material) => {
                let mut certificate = HttpsCertificateConfigurationContext::for_container(&material);
                for callback in container.certificate_callbacks() {
                    callback(&mut certificate)?;
                }
                volumes.extend(certificate.mounts().iter().cloned());
                args.append(&mut certificate.arguments);
                env.environment_variables.append(&mut certificate.environment_variables);
            }
            None => {
                return Err(AppHostError::Callback {
                    resource: name.to_string(),
                    message: "HTTPS endpoint declared but no certificate available".to_string(),
                })
            }
        }
    }

    debug!(
        "Resource '{}' environment keys: {:?}",
        name,
        env.environment_variables
            .iter()
            .map(|(key, value)| if value.is_secret() { format!("{} (secret)", key) } else { key.clone() })
            .collect::<Vec<_>>()
    );
    let environment = resolve_environment(&env.environment_variables, values)?;

    let health_probes = container
        .health_checks
        .iter()
        .filter_map(|check| {
            endpoints
                .iter()
                .find(|e| e.name == check.endpoint_name)
                .map(|e| HealthProbe {
                    endpoint_name: check.endpoint_name.clone(),
                    url: format!("{}{}", e.url(), check.path),
                })
        })
        .collect();

    let urls = endpoints
        .iter()
        .map(|e| ResourceUrl {
            endpoint_name: e.name.clone(),
            url: e.url(),
            display_location: container
                .urls
                .iter()
                .find(|u| u.endpoint_name == e.name)
                .map(|u| u.display_location)
                .unwrap_or(UrlDisplayLocation::SummaryAndDetails),
        })
        .collect();

    Ok(ContainerLaunchSpec {
        resource_name: name.to_string(),
        image: container.image.reference(),
        args,
        environment,
        endpoints,
        volumes,
        health_probes,
        urls,
    })
}
