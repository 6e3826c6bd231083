// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::certificate::{CertificateConfigurationCallback, HttpsCertificateAnnotation};
use crate::domain::endpoint::{Endpoint, UrlAnnotation};
use crate::domain::environment::EnvironmentCallback;
use crate::domain::error::AppHostError;
use crate::domain::volume::VolumeMount;

const MAX_RESOURCE_NAME_LENGTH: usize = 64;

/// Registry, image and tag of a container image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    pub image: String,
    pub tag: String,
}

impl ContainerImage {
    pub fn new(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            registry: None,
            image: image.into(),
            tag: tag.into(),
        }
    }

    /// Fully qualified reference, e.g. `quay.io/keycloak/keycloak:26.4`.
    pub fn reference(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}:{}", registry, self.image, self.tag),
            None => format!("{}:{}", self.image, self.tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHealthCheck {
    pub endpoint_name: String,
    pub path: String,
}

/// A container in the application graph.
pub struct ContainerResource {
    name: String,
    pub image: ContainerImage,
    endpoints: Vec<Endpoint>,
    pub args: Vec<String>,
    pub volumes: Vec<VolumeMount>,
    pub health_checks: Vec<HttpHealthCheck>,
    pub urls: Vec<UrlAnnotation>,
    environment: Vec<EnvironmentCallback>,
    certificate_configuration: Vec<CertificateConfigurationCallback>,
    https_certificate: Option<HttpsCertificateAnnotation>,
}

impl ContainerResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: ContainerImage::default(),
            endpoints: Vec::new(),
            args: Vec::new(),
            volumes: Vec::new(),
            health_checks: Vec::new(),
            urls: Vec::new(),
            environment: Vec::new(),
            certificate_configuration: Vec::new(),
            https_certificate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    pub fn endpoint_mut(&mut self, name: &str) -> Option<&mut Endpoint> {
        self.endpoints.iter_mut().find(|e| e.name == name)
    }

    pub fn add_endpoint(&mut self, endpoint: Endpoint) -> Result<(), AppHostError> {
        if self.endpoint(&endpoint.name).is_some() {
            return Err(AppHostError::DuplicateEndpoint {
                resource: self.name.clone(),
                endpoint: endpoint.name,
            });
        }
        self.endpoints.push(endpoint);
        Ok(())
    }

    pub fn environment_callbacks(&self) -> &[EnvironmentCallback] {
        &self.environment
    }

    pub fn add_environment_callback(&mut self, callback: EnvironmentCallback) {
        self.environment.push(callback);
    }

    pub fn certificate_callbacks(&self) -> &[CertificateConfigurationCallback] {
        &self.certificate_configuration
    }

    pub fn add_certificate_callback(&mut self, callback: CertificateConfigurationCallback) {
        self.certificate_configuration.push(callback);
    }

    /// The most recently attached HTTPS certificate annotation.
    pub fn https_certificate(&self) -> Option<&HttpsCertificateAnnotation> {
        self.https_certificate.as_ref()
    }

    pub fn set_https_certificate(&mut self, annotation: HttpsCertificateAnnotation) {
        self.https_certificate = Some(annotation);
    }
}

impl fmt::Debug for ContainerResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerResource")
            .field("name", &self.name)
            .field("image", &self.image)
            .field("endpoints", &self.endpoints)
            .field("args", &self.args)
            .field("volumes", &self.volumes)
            .field("health_checks", &self.health_checks)
            .field("environment_callbacks", &self.environment.len())
            .field("certificate_callbacks", &self.certificate_configuration.len())
            .field("https_certificate", &self.https_certificate)
            .finish()
    }
}

/// Anything in the graph that is backed by a container.
pub trait Resource: Send + Sync + 'static {
    fn container(&self) -> &ContainerResource;
    fn container_mut(&mut self) -> &mut ContainerResource;

    fn name(&self) -> &str {
        self.container().name()
    }
}

impl Resource for ContainerResource {
    fn container(&self) -> &ContainerResource {
        self
    }

    fn container_mut(&mut self) -> &mut ContainerResource {
        self
    }
}

/// Resource names are ASCII letters, digits and single hyphens, start with a
/// letter, do not end with a hyphen and are at most 64 characters long.
pub fn validate_resource_name(name: &str) -> Result<(), AppHostError> {
    if name.is_empty() {
        return Err(AppHostError::InvalidArgument("resource name cannot be empty".to_string()));
    }
    if name.len() > MAX_RESOURCE_NAME_LENGTH {
        return Err(AppHostError::InvalidArgument(format!(
            "resource name '{}' exceeds {} characters",
            name, MAX_RESOURCE_NAME_LENGTH
        )));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(AppHostError::InvalidArgument(format!(
            "resource name '{}' must start with an ASCII letter",
            name
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AppHostError::InvalidArgument(format!(
            "resource name '{}' may only contain ASCII letters, digits and hyphens",
            name
        )));
    }
    if name.ends_with('-') || name.contains("--") {
        return Err(AppHostError::InvalidArgument(format!(
            "resource name '{}' cannot end with a hyphen or contain consecutive hyphens",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::endpoint::UriScheme;

    #[test]
    fn test_image_reference() {
        let mut image = ContainerImage::new("keycloak/keycloak", "26.4");
        assert_eq!(image.reference(), "keycloak/keycloak:26.4");
        image.registry = Some("quay.io".to_string());
        assert_eq!(image.reference(), "quay.io/keycloak/keycloak:26.4");
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let mut resource = ContainerResource::new("api");
        resource.add_endpoint(Endpoint::new("http", UriScheme::Http, 8080, None)).unwrap();
        let err = resource
            .add_endpoint(Endpoint::new("http", UriScheme::Http, 8081, None))
            .unwrap_err();
        assert!(matches!(err, AppHostError::DuplicateEndpoint { .. }));
    }

    #[test]
    fn test_resource_name_rules() {
        assert!(validate_resource_name("keycloak").is_ok());
        assert!(validate_resource_name("api-service2").is_ok());
        assert!(validate_resource_name("").is_err());
        assert!(validate_resource_name("1keycloak").is_err());
        assert!(validate_resource_name("key_cloak").is_err());
        assert!(validate_resource_name("keycloak-").is_err());
        assert!(validate_resource_name("key--cloak").is_err());
        assert!(validate_resource_name(&"a".repeat(65)).is_err());
    }
}
