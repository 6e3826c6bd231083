// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The application graph this AppHost runs: an admin username and password
//! parameter, a Keycloak container with pinned ports and a data volume, and
//! an optional API service container.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use apphost_core::application::builder::{AppHostOptions, DistributedApplication, DistributedApplicationBuilder};
use apphost_core::application::keycloak::KeycloakHostingExt;
use apphost_core::domain::app_config::AppHostConfigManifest;
use apphost_core::domain::execution::ExecutionMode;
use apphost_core::domain::parameter::ParameterValues;

pub const USERNAME_PARAMETER: &str = "username";
pub const PASSWORD_PARAMETER: &str = "password";

pub fn build_topology(
    config: &AppHostConfigManifest,
    mode: ExecutionMode,
    app_dir: &Path,
) -> Result<DistributedApplication> {
    let mut builder = DistributedApplicationBuilder::new(AppHostOptions {
        app_name: config.metadata.name.clone(),
        app_dir: app_dir.to_path_buf(),
        mode,
        parameter_values: ParameterValues::new(config.spec.parameters.clone()).with_environment(),
    });

    let username = builder.add_parameter(USERNAME_PARAMETER, false)?;
    let password = builder.add_parameter(PASSWORD_PARAMETER, true)?;

    let keycloak_config = &config.spec.keycloak;
    let keycloak = builder
        .add_keycloak_fixed_https_port(
            &keycloak_config.name,
            keycloak_config.http_port,
            keycloak_config.https_port,
            Some(username),
            Some(password),
        )
        .with_context(|| format!("Failed to add Keycloak resource '{}'", keycloak_config.name))?;

    let keycloak = match keycloak_config.data_volume.as_deref() {
        Some(volume) => keycloak.with_data_volume(Some(volume).filter(|v| !v.is_empty())),
        None => {
            debug!("Keycloak data volume disabled");
            keycloak
        }
    };

    if let Some(directory) = &keycloak_config.realm_import {
        keycloak.with_realm_import(directory);
    }

    if let Some(api) = &config.spec.api_service {
        let service = builder
            .add_container(&api.name, &api.image, &api.tag)?
            .with_http_endpoint(api.port, api.target_port, None)?
            .with_http_health_check("http", &api.health_path)
            .with_context(|| format!("Failed to add API service '{}'", api.name))?;
        api.environment
            .iter()
            .fold(service, |service, (key, value)| service.with_environment_value(key, value.as_str()));
    }

    Ok(builder.build())
}
