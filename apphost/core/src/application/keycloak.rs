// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Keycloak hosting extension.
//!
//! Adds a Keycloak container whose plaintext and HTTPS host ports can be
//! pinned, so the authority URL is the same on every local run. The HTTPS
//! endpoint is only added once the developer certificate policy is known, in
//! the before-start event, and before any host port is allocated.

use std::path::Path;
use tracing::{debug, info};

use crate::application::builder::{DistributedApplicationBuilder, ResourceBuilder};
use crate::domain::certificate::should_enable_https;
use crate::domain::endpoint::{UriScheme, UrlDisplayLocation};
use crate::domain::environment::EnvironmentValue;
use crate::domain::error::AppHostError;
use crate::domain::keycloak::KeycloakResource;
use crate::domain::parameter::ParameterResource;
use crate::domain::resource::{validate_resource_name, Resource};
use crate::domain::volume::generate_volume_name;

pub const KEYCLOAK_REGISTRY: &str = "quay.io";
pub const KEYCLOAK_IMAGE: &str = "keycloak/keycloak";
pub const KEYCLOAK_TAG: &str = "26.4";

pub const DEFAULT_CONTAINER_PORT: u16 = 8080;
pub const DEFAULT_HTTPS_PORT: u16 = 8443;
pub const MANAGEMENT_INTERFACE_CONTAINER_PORT: u16 = 9000;
pub const MANAGEMENT_ENDPOINT_NAME: &str = "management";
pub const HEALTH_READY_PATH: &str = "/health/ready";
pub const DATA_VOLUME_TARGET: &str = "/opt/keycloak/data";
pub const REALM_IMPORT_TARGET: &str = "/opt/keycloak/data/import";

const ADMIN_ENV_VAR: &str = "KC_BOOTSTRAP_ADMIN_USERNAME";
const ADMIN_PASSWORD_ENV_VAR: &str = "KC_BOOTSTRAP_ADMIN_PASSWORD";
const HEALTH_CHECK_ENV_VAR: &str = "KC_HEALTH_ENABLED";
const HTTPS_PORT_ENV_VAR: &str = "KC_HTTPS_PORT";

pub trait KeycloakHostingExt {
    /// Add a Keycloak container with optionally pinned HTTP and HTTPS host
    /// ports. `None` ports are allocated ephemerally. Without an admin
    /// password a secret `{name}-password` parameter is generated.
    fn add_keycloak_fixed_https_port(
        &mut self,
        name: &str,
        http_port: Option<u16>,
        https_port: Option<u16>,
        admin_username: Option<ParameterResource>,
        admin_password: Option<ParameterResource>,
    ) -> Result<ResourceBuilder<KeycloakResource>, AppHostError>;
}

impl KeycloakHostingExt for DistributedApplicationBuilder {
    fn add_keycloak_fixed_https_port(
        &mut self,
        name: &str,
        http_port: Option<u16>,
        https_port: Option<u16>,
        admin_username: Option<ParameterResource>,
        admin_password: Option<ParameterResource>,
    ) -> Result<ResourceBuilder<KeycloakResource>, AppHostError> {
        validate_resource_name(name)?;

        let password = match admin_password {
            Some(password) => password,
            None => self.create_default_password_parameter(&format!("{}-password", name))?,
        };

        let resource = KeycloakResource::new(name, admin_username, password);
        let admin_reference = resource.admin_reference();
        let admin_password: EnvironmentValue = resource.admin_password_parameter().clone().into();

        let keycloak = self
            .add_resource(resource)?
            .with_image(KEYCLOAK_IMAGE)
            .with_image_registry(KEYCLOAK_REGISTRY)
            .with_image_tag(KEYCLOAK_TAG)
            .with_http_endpoint(http_port, DEFAULT_CONTAINER_PORT, None)?
            .with_http_endpoint(None, MANAGEMENT_INTERFACE_CONTAINER_PORT, Some(MANAGEMENT_ENDPOINT_NAME))?
            .with_http_health_check(MANAGEMENT_ENDPOINT_NAME, HEALTH_READY_PATH)?
            .with_environment(move |ctx| {
                ctx.set(ADMIN_ENV_VAR, admin_reference.clone());
                ctx.set(ADMIN_PASSWORD_ENV_VAR, admin_password.clone());
                ctx.set(HEALTH_CHECK_ENV_VAR, "true");
                Ok(())
            })
            .with_url_for_endpoint(MANAGEMENT_ENDPOINT_NAME, UrlDisplayLocation::DetailsOnly)
            .with_https_certificate_configuration(|ctx| {
                match ctx.password.clone() {
                    None => {
                        let certificate = ctx.certificate_path.clone();
                        let key = ctx.key_path.clone();
                        ctx.environment_variables
                            .insert("KC_HTTPS_CERTIFICATE_FILE".to_string(), certificate.into());
                        ctx.environment_variables
                            .insert("KC_HTTPS_CERTIFICATE_KEY_FILE".to_string(), key.into());
                    }
                    Some(password) => {
                        let pfx = ctx.pfx_path.clone();
                        ctx.environment_variables
                            .insert("KC_HTTPS_KEY_STORE_FILE".to_string(), pfx.into());
                        ctx.environment_variables
                            .insert("KC_HTTPS_KEY_STORE_TYPE".to_string(), "pkcs12".into());
                        ctx.environment_variables
                            .insert("KC_HTTPS_KEY_STORE_PASSWORD".to_string(), password);
                    }
                }
                Ok(())
            });

        if self.execution_context().is_run_mode() {
            let deferred = keycloak.clone();
            self.eventing().subscribe_before_start(move |event| {
                let developer_default = event.developer_certificates().use_for_https();
                let add_https = {
                    let resource = deferred.resource();
                    let resource = resource.read();
                    should_enable_https(resource.container().https_certificate(), developer_default)
                };

                debug!(
                    "HTTPS decision for '{}': {} (developer default: {})",
                    deferred.name(),
                    add_https,
                    developer_default
                );

                if add_https {
                    let resource_name = deferred.name();
                    deferred
                        .with_https_endpoint(https_port, DEFAULT_HTTPS_PORT, None, Some(HTTPS_PORT_ENV_VAR))
                        .and_then(|keycloak| {
                            keycloak.with_endpoint(MANAGEMENT_ENDPOINT_NAME, |ep| ep.scheme = UriScheme::Https)
                        })
                        .map_err(|e| AppHostError::Callback {
                            resource: resource_name,
                            message: e.to_string(),
                        })?;
                }
                Ok(())
            });
        }

        let keycloak = if self.execution_context().is_run_mode() {
            keycloak.with_args(["start-dev"])
        } else {
            info!("Publish mode: HTTPS endpoint for '{}' is not added", name);
            keycloak.with_args(["start"])
        };

        Ok(keycloak.with_args(["--import-realm"]))
    }
}

impl ResourceBuilder<KeycloakResource> {
    /// Persist Keycloak data in a named volume. Without a name one is derived
    /// from the application identity and the resource name.
    pub fn with_data_volume(self, name: Option<&str>) -> Self {
        let volume_name = match name {
            Some(name) => name.to_string(),
            None => generate_volume_name(self.identity(), &self.name(), "data"),
        };
        self.with_volume(&volume_name, DATA_VOLUME_TARGET, false)
    }

    /// Bind-mount a host directory of realm files where `--import-realm`
    /// picks them up.
    pub fn with_realm_import(self, import_directory: &Path) -> Self {
        self.with_bind_mount(&import_directory.to_string_lossy(), REALM_IMPORT_TARGET, true)
    }
}
